use std::io::Cursor;

use bytes::{Buf, Bytes, BytesMut};
use futures::StreamExt;
use http::StatusCode;
use micro_chunked::connection::{BodyReader, EncodeSession};
use micro_chunked::protocol::{DecodeError, ParseError, PayloadItem};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Chain};
use tokio_util::codec::Decoder;
use tracing::{debug, info};

use crate::head::{INIT_HEADER_SIZE, RequestHead, ResponseHead, ResponseHeadDecoder, is_chunked};
use crate::ClientError;

/// Sends the request head of an upload and opens its chunked body.
///
/// `head` should carry a method with a request body, `PUT` or `POST`. Nothing is read
/// from `reader` until [`Upload::finish`].
pub async fn start_upload<R, W>(reader: R, mut writer: W, head: &RequestHead, read_capacity: usize) -> Result<Upload<R, W>, ClientError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_request_head(&mut writer, head, true).await?;
    info!(method = %head.method(), path = head.path(), "upload started");

    Ok(Upload { reader, session: EncodeSession::open(writer), read_capacity })
}

/// Sends the request head of a download and waits for the response head.
///
/// # Errors
///
/// Besides transport and head errors, returns [`ClientError::NotChunked`] if the
/// response does not carry a chunked body.
pub async fn start_download<R, W>(mut reader: R, mut writer: W, head: &RequestHead, read_capacity: usize) -> Result<Download<R, W>, ClientError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_request_head(&mut writer, head, false).await?;

    let mut buffer = BytesMut::with_capacity(read_capacity);
    let response = read_response_head(&mut reader, &mut buffer).await?;
    if !is_chunked(&response) {
        return Err(ClientError::not_chunked(response.status()));
    }
    info!(path = head.path(), status = %response.status(), "download started");

    // the body may already have started in the bytes read along with the head
    let residue = buffer.split().freeze();
    let body = BodyReader::with_capacity(AsyncReadExt::chain(Cursor::new(residue), reader), read_capacity);

    Ok(Download { head: response, body, _writer: writer })
}

async fn write_request_head<W>(writer: &mut W, head: &RequestHead, chunked: bool) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin,
{
    let mut buffer = BytesMut::with_capacity(INIT_HEADER_SIZE);
    head.encode(chunked, &mut buffer)?;
    writer.write_all(&buffer).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads until a complete response head is decoded, leaving any following bytes in `buffer`.
async fn read_response_head<R>(reader: &mut R, buffer: &mut BytesMut) -> Result<ResponseHead, ClientError>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = ResponseHeadDecoder;
    loop {
        if let Some(head) = decoder.decode(buffer)? {
            debug!(status = %head.status(), residue = buffer.len(), "received response head");
            return Ok(head);
        }

        buffer.reserve(INIT_HEADER_SIZE);
        if reader.read_buf(buffer).await? == 0 {
            return Err(ClientError::ClosedBeforeHead);
        }
    }
}

/// An upload in progress: the request head is sent, the body is being written.
#[derive(Debug)]
pub struct Upload<R, W> {
    reader: R,
    session: EncodeSession<W>,
    read_capacity: usize,
}

impl<R, W> Upload<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Sends one chunk and flushes it.
    pub async fn emit<D: Buf>(&mut self, payload: D) -> Result<(), ClientError> {
        Ok(self.session.emit(payload).await?)
    }

    /// Sends the last chunk. The response is read by [`finish`](Self::finish).
    pub async fn close(&mut self) -> Result<(), ClientError> {
        Ok(self.session.close().await?)
    }

    #[inline]
    pub fn session(&self) -> &EncodeSession<W> {
        &self.session
    }

    /// Closes the body if needed, then waits for the response head.
    ///
    /// The response body, if any, is not read.
    pub async fn finish(mut self) -> Result<ResponseHead, ClientError> {
        if !self.session.is_closed() {
            self.session.close().await?;
        }

        let mut buffer = BytesMut::with_capacity(self.read_capacity);
        let head = read_response_head(&mut self.reader, &mut buffer).await?;
        info!(status = %head.status(), chunks = self.session.sent_chunks(), bytes = self.session.sent_bytes(), "upload finished");
        Ok(head)
    }
}

/// A download in progress: the response head is received, the body is being read.
#[derive(Debug)]
pub struct Download<R, W> {
    head: ResponseHead,
    body: BodyReader<Chain<Cursor<Bytes>, R>>,
    // kept so the request direction is not shut down while the body is read
    _writer: W,
}

impl<R, W> Download<R, W>
where
    R: AsyncRead + Unpin,
{
    #[inline]
    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    #[inline]
    pub fn body_mut(&mut self) -> &mut BodyReader<Chain<Cursor<Bytes>, R>> {
        &mut self.body
    }

    /// Returns the next chunk, or `None` once the last chunk was received.
    ///
    /// After a failure every call returns that failure again.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, ClientError> {
        match self.body.next().await {
            Some(Ok(PayloadItem::Chunk(bytes))) => Ok(Some(bytes)),
            Some(Ok(PayloadItem::Eof)) => Ok(None),
            Some(Err(e)) => Err(e.into()),
            None if self.body.phase().is_done() => Ok(None),
            None => {
                let decoder = self.body.decoder();
                Err(ParseError::from(DecodeError::truncated_stream(decoder.phase(), decoder.consumed())).into())
            }
        }
    }

    /// Reads the rest of the body, returning its chunks in order.
    pub async fn read_to_end(&mut self) -> Result<Vec<Bytes>, ClientError> {
        Ok(self.body.read_to_end().await?)
    }
}
