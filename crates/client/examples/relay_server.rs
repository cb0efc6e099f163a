//! A relay for chunked bodies: what is `PUT` on a path streams out to every `GET` of
//! that path while the upload is still running.
//!
//! - `PUT /<path>`: stores the chunked body as it arrives, `201 Created` or `200 OK` if replaced
//! - `GET /<path>`: streams the stored bytes, then waits for more until the upload is complete
//! - `DELETE /<path>`: forgets the path
//! - `LIST /<prefix>`: lists stored paths starting with `prefix`, one per line
//! - `GET /`: an index of every stored path
//!
//! ```text
//! cargo run -p micro-chunked-client --example relay_server -- 0.0.0.0:3000
//! ```

use bytes::{Buf, Bytes, BytesMut};
use http::{Method, StatusCode};
use httparse::Status;
use micro_chunked::connection::{BodyReader, EncodeSession};
use micro_chunked::protocol::PayloadItem;
use std::collections::BTreeMap;
use std::error::Error;
use std::io::Cursor;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

type BoxError = Box<dyn Error + Send + Sync>;

const MAX_HEADER_NUM: usize = 64;
const MAX_HEADER_BYTES: usize = 8 * 1024;
/// Largest chunk sent to a downloader at once.
const MAX_CHUNK_SIZE: usize = 32 * 1024;

#[derive(Debug, Default)]
struct File {
    state: Mutex<FileState>,
    changed: Notify,
}

#[derive(Debug, Default)]
struct FileState {
    data: Vec<u8>,
    done: bool,
}

impl File {
    async fn append(&self, bytes: &[u8]) {
        self.state.lock().await.data.extend_from_slice(bytes);
        self.changed.notify_waiters();
    }

    async fn complete(&self) {
        self.state.lock().await.done = true;
        self.changed.notify_waiters();
    }
}

/// Stored paths, without the leading `/`.
#[derive(Debug, Default)]
struct Store {
    files: RwLock<BTreeMap<String, Arc<File>>>,
}

impl Store {
    async fn keys_by_prefix(&self, prefix: &str) -> Vec<String> {
        let files = self.files.read().await;
        files.range(prefix.to_string()..).map(|(key, _)| key).take_while(|key| key.starts_with(prefix)).cloned().collect()
    }
}

#[derive(Debug)]
struct Request {
    method: Method,
    key: String,
    chunked: bool,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let address = std::env::args().nth(1).unwrap_or_else(|| "0.0.0.0:3000".to_string());
    let listener = match TcpListener::bind(address.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(cause = %e, address = %address, "bind server error");
            return;
        }
    };
    info!(address = %address, "start listening");

    let store = Arc::new(Store::default());
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let store = store.clone();
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            if let Err(e) = serve(reader, writer, &store).await {
                error!(cause = %e, %remote_addr, "connection failed");
            }
        });
    }
}

async fn serve(mut reader: OwnedReadHalf, mut writer: OwnedWriteHalf, store: &Store) -> Result<(), BoxError> {
    let mut buffer = BytesMut::with_capacity(MAX_HEADER_BYTES);
    let Some(request) = read_request(&mut reader, &mut buffer).await? else {
        return Ok(());
    };

    match (&request.method, request.key.as_str()) {
        (&Method::GET, "") => {
            let keys = store.keys_by_prefix("").await;
            let index = keys.iter().map(|key| format!(r#"<a href="/{key}">{key}</a><br>"#)).collect::<Vec<_>>().join("\n");
            write_response(&mut writer, StatusCode::OK, "text/html", index.as_bytes()).await
        }
        (&Method::PUT, key) if !key.is_empty() => {
            if !request.chunked {
                return write_response(&mut writer, StatusCode::LENGTH_REQUIRED, "text/plain", b"chunked body expected").await;
            }
            // bytes read along with the head belong to the body
            let residue = buffer.split().freeze();
            let body = BodyReader::new(AsyncReadExt::chain(Cursor::new(residue), reader));
            handle_put(key, body, &mut writer, store).await
        }
        (&Method::GET, key) => handle_get(key, writer, store).await,
        (&Method::DELETE, key) => {
            info!(key, "DELETE");
            store.files.write().await.remove(key);
            write_response(&mut writer, StatusCode::OK, "text/plain", b"").await
        }
        (method, prefix) if method.as_str() == "LIST" => {
            info!(prefix, "LIST");
            let keys = store.keys_by_prefix(prefix).await.join("\n");
            write_response(&mut writer, StatusCode::OK, "text/plain", keys.as_bytes()).await
        }
        _ => write_response(&mut writer, StatusCode::METHOD_NOT_ALLOWED, "text/plain", b"").await,
    }
}

async fn handle_put<R>(key: &str, mut body: BodyReader<R>, writer: &mut OwnedWriteHalf, store: &Store) -> Result<(), BoxError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let file = Arc::new(File::default());
    let replaced = store.files.write().await.insert(key.to_string(), file.clone()).is_some();
    info!(key, replaced, "PUT streaming start");

    let result = loop {
        match futures::StreamExt::next(&mut body).await {
            Some(Ok(PayloadItem::Chunk(bytes))) => file.append(&bytes).await,
            Some(Ok(PayloadItem::Eof)) | None => break Ok(()),
            Some(Err(e)) => break Err(e),
        }
    };
    // downloaders stop either way, a broken upload must not keep them waiting
    file.complete().await;

    match result {
        Ok(()) => {
            info!(key, consumed = body.decoder().consumed(), "PUT streaming end");
            let status = if replaced { StatusCode::OK } else { StatusCode::CREATED };
            write_response(writer, status, "text/plain", b"").await
        }
        Err(e) => {
            error!(key, cause = %e, "PUT body failed");
            write_response(writer, StatusCode::BAD_REQUEST, "text/plain", e.to_string().as_bytes()).await
        }
    }
}

async fn handle_get(key: &str, mut writer: OwnedWriteHalf, store: &Store) -> Result<(), BoxError> {
    let Some(file) = store.files.read().await.get(key).cloned() else {
        info!(key, "GET [404]");
        return write_response(&mut writer, StatusCode::NOT_FOUND, "text/plain", b"").await;
    };

    writer.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n").await?;
    let mut session = EncodeSession::open(writer);
    let mut sent = 0;
    loop {
        // registered before looking, so an append in between is not missed
        let changed = file.changed.notified();
        let (chunk, done) = {
            let state = file.state.lock().await;
            let end = state.data.len().min(sent + MAX_CHUNK_SIZE);
            (Bytes::copy_from_slice(&state.data[sent..end]), state.done)
        };

        if !chunk.is_empty() {
            sent += chunk.len();
            session.emit(chunk).await?;
        } else if done {
            break;
        } else {
            changed.await;
        }
    }

    session.close().await?;
    info!(key, sent, "GET streaming end");
    Ok(())
}

async fn read_request(reader: &mut OwnedReadHalf, buffer: &mut BytesMut) -> Result<Option<Request>, BoxError> {
    loop {
        let parsed = {
            let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
            let mut req = httparse::Request::new(&mut headers);
            match req.parse(&buffer[..])? {
                Status::Complete(offset) => {
                    let method = Method::from_bytes(req.method.unwrap_or_default().as_bytes())?;
                    let path = req.path.unwrap_or("/");
                    let key = path.split('?').next().unwrap_or_default().trim_start_matches('/').to_string();
                    let chunked = req.headers.iter().any(|h| {
                        h.name.eq_ignore_ascii_case("transfer-encoding")
                            && std::str::from_utf8(h.value).is_ok_and(|v| v.trim().to_ascii_lowercase().ends_with("chunked"))
                    });
                    Some((offset, Request { method, key, chunked }))
                }
                Status::Partial => None,
            }
        };

        if let Some((offset, request)) = parsed {
            buffer.advance(offset);
            return Ok(Some(request));
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Err("request head too large".into());
        }
        if reader.read_buf(buffer).await? == 0 {
            return Ok(None);
        }
    }
}

async fn write_response<W>(writer: &mut W, status: StatusCode, content_type: &str, body: &[u8]) -> Result<(), BoxError>
where
    W: AsyncWrite + Unpin,
{
    let reason = status.canonical_reason().unwrap_or_default();
    let head = format!(
        "HTTP/1.1 {} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status.as_u16(),
        body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}
