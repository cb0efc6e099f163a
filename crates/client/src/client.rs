use http::{HeaderMap, HeaderName, HeaderValue, Method};
use micro_chunked::connection::DEFAULT_READ_CAPACITY;
use std::net::{SocketAddr, ToSocketAddrs};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, error};

use crate::head::RequestHead;
use crate::transfer::{Download, Upload, start_download, start_upload};
use crate::{ClientBuildError, ClientError};

#[derive(Debug)]
pub struct ClientBuilder {
    address: Option<std::io::Result<Vec<SocketAddr>>>,
    host: Option<String>,
    headers: HeaderMap,
    read_buffer_capacity: usize,
}

impl ClientBuilder {
    fn new() -> Self {
        Self { address: None, host: None, headers: HeaderMap::new(), read_buffer_capacity: DEFAULT_READ_CAPACITY }
    }

    /// The server to connect to. Every resolved address is tried in order.
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    /// Value of the `Host` header, defaults to the first resolved address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// An extra header sent with every request.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn read_buffer_capacity(mut self, capacity: usize) -> Self {
        self.read_buffer_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<Client, ClientBuildError> {
        let address = self.address.ok_or(ClientBuildError::MissingAddress)?.map_err(|source| ClientBuildError::InvalidAddress { source })?;
        let first = address.first().ok_or(ClientBuildError::EmptyAddress)?;
        let host = self.host.unwrap_or_else(|| first.to_string());

        Ok(Client { address, host, headers: self.headers, read_buffer_capacity: self.read_buffer_capacity })
    }
}

/// A client streaming chunked bodies to and from one server.
///
/// Every upload and download opens its own connection, so one client can run both
/// directions at the same time from separate tasks.
#[derive(Debug, Clone)]
pub struct Client {
    address: Vec<SocketAddr>,
    host: String,
    headers: HeaderMap,
    read_buffer_capacity: usize,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    #[inline]
    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Opens a connection and starts a `PUT` of a chunked body to `path`.
    pub async fn upload(&self, path: &str) -> Result<Upload<OwnedReadHalf, OwnedWriteHalf>, ClientError> {
        let head = self.request_head(Method::PUT, path)?;
        let (reader, writer) = self.connect().await?.into_split();
        start_upload(reader, writer, &head, self.read_buffer_capacity).await
    }

    /// Opens a connection and starts a `GET` of the chunked body at `path`.
    pub async fn download(&self, path: &str) -> Result<Download<OwnedReadHalf, OwnedWriteHalf>, ClientError> {
        let head = self.request_head(Method::GET, path)?;
        let (reader, writer) = self.connect().await?.into_split();
        start_download(reader, writer, &head, self.read_buffer_capacity).await
    }

    fn request_head(&self, method: Method, path: &str) -> Result<RequestHead, ClientError> {
        let mut head = RequestHead::new(method, path, &self.host)?;
        head.headers_mut().extend(self.headers.clone());
        Ok(head)
    }

    async fn connect(&self) -> Result<TcpStream, ClientError> {
        let stream = match TcpStream::connect(self.address.as_slice()).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(cause = %e, address = ?self.address, "connect error");
                return Err(ClientError::connect(e));
            }
        };

        // chunks are flushed one by one, don't let them wait for each other
        stream.set_nodelay(true)?;
        debug!(local = ?stream.local_addr().ok(), peer = ?stream.peer_addr().ok(), "connected");
        Ok(stream)
    }
}
