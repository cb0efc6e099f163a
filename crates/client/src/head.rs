//! Request head encoding and response head decoding.
//!
//! Only what is needed to get at the body is handled here: the request line and a
//! handful of headers on the way out, and the status line and headers on the way in.
//! Everything after the response head is left untouched for the body reader.
//!
//! # Limits
//!
//! - Maximum number of response headers: 64
//! - Maximum response head size: 8KB

use bytes::{Buf, BufMut, BytesMut};
use http::uri::PathAndQuery;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode, Version};
use httparse::Status;
use std::io;
use std::io::Write;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ClientError;

/// Maximum number of headers allowed in a response
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire response head
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Initial buffer size allocated for request head serialization
pub(crate) const INIT_HEADER_SIZE: usize = 1024;

/// Type alias for a response head, the body is read separately.
pub type ResponseHead = Response<()>;

/// Request line and headers sent ahead of the body.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    path: PathAndQuery,
    host: HeaderValue,
    headers: HeaderMap,
}

impl RequestHead {
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if `path` is not an absolute path or
    /// `host` is not a valid header value.
    pub fn new(method: Method, path: &str, host: &str) -> Result<Self, ClientError> {
        if !path.starts_with('/') {
            return Err(ClientError::invalid_request(format!("path must start with '/': {path}")));
        }

        let path = path.parse::<PathAndQuery>().map_err(|e| ClientError::invalid_request(format!("invalid path {path}: {e}")))?;
        let host = HeaderValue::from_str(host).map_err(|e| ClientError::invalid_request(format!("invalid host {host}: {e}")))?;

        Ok(Self { method, path, host, headers: HeaderMap::new() })
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Extra headers written after `Host`.
    ///
    /// `Host`, `Transfer-Encoding` and `Connection` are managed by the client and
    /// skipped here.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Writes the request head, announcing a chunked body if `chunked` is set.
    pub(crate) fn encode(&self, chunked: bool, dst: &mut BytesMut) -> io::Result<()> {
        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "{} {} HTTP/1.1\r\n", self.method, self.path)?;

        put_header(dst, &header::HOST, &self.host);
        for (name, value) in &self.headers {
            if name == header::HOST || name == header::TRANSFER_ENCODING || name == header::CONNECTION {
                continue;
            }
            put_header(dst, name, value);
        }

        if chunked {
            put_header(dst, &header::TRANSFER_ENCODING, &HeaderValue::from_static("chunked"));
        }
        put_header(dst, &header::CONNECTION, &HeaderValue::from_static("close"));
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

fn put_header(dst: &mut BytesMut, name: &HeaderName, value: &HeaderValue) {
    dst.put_slice(name.as_str().as_bytes());
    dst.put_slice(b": ");
    dst.put_slice(value.as_bytes());
    dst.put_slice(b"\r\n");
}

/// Returns true if the last transfer coding of the response is `chunked`.
pub(crate) fn is_chunked(head: &ResponseHead) -> bool {
    head.headers()
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .next_back()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Decoder for HTTP response heads implementing the [`Decoder`] trait.
///
/// On success the head is split off the buffer, whatever follows it stays in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseHeadDecoder;

impl Decoder for ResponseHeadDecoder {
    type Item = ResponseHead;
    type Error = ClientError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut res = httparse::Response::new(&mut headers);

        let body_offset = match res.parse(src) {
            Ok(Status::Complete(body_offset)) => body_offset,
            Ok(Status::Partial) => {
                if src.len() > MAX_HEADER_BYTES {
                    return Err(ClientError::too_large_head(src.len(), MAX_HEADER_BYTES));
                }
                return Ok(None);
            }
            Err(httparse::Error::TooManyHeaders) => return Err(ClientError::too_many_headers(MAX_HEADER_NUM)),
            Err(e) => return Err(ClientError::invalid_head(e)),
        };

        trace!(head_size = body_offset, "parsed response head");
        if body_offset > MAX_HEADER_BYTES {
            return Err(ClientError::too_large_head(body_offset, MAX_HEADER_BYTES));
        }

        let version = match res.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            v => return Err(ClientError::invalid_head(format!("unsupported http version: {v:?}"))),
        };

        let code = res.code.ok_or_else(|| ClientError::invalid_head("missing status code"))?;
        let status = StatusCode::from_u16(code).map_err(ClientError::invalid_head)?;

        let mut builder = Response::builder().status(status).version(version);
        if let Some(headers) = builder.headers_mut() {
            headers.reserve(res.headers.len());
            for h in res.headers.iter() {
                let name = HeaderName::from_bytes(h.name.as_bytes()).map_err(ClientError::invalid_head)?;
                let value = HeaderValue::from_bytes(h.value).map_err(ClientError::invalid_head)?;
                headers.append(name, value);
            }
        }
        let head = builder.body(()).map_err(ClientError::invalid_head)?;

        src.advance(body_offset);
        Ok(Some(head))
    }
}

/// Fast writer implementation for writing to BytesMut.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
