use crate::codec::ChunkedEncoder;
use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, Bytes};
use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio_util::codec::FramedWrite;
use tracing::{debug, error};

/// The sending half of a chunked body.
///
/// Owns the destination writer for the whole lifetime of the body:
/// open → (emit)* → close. Every `emit` writes one chunk frame and flushes it, so the
/// peer sees each payload as soon as it is produced. `close` writes the terminal frame,
/// after which neither `emit` nor `close` are accepted anymore.
#[derive(Debug)]
pub struct EncodeSession<W> {
    framed_write: FramedWrite<W, ChunkedEncoder>,
}

impl<W> EncodeSession<W>
where
    W: AsyncWrite + Unpin,
{
    /// Starts a body on `writer`. Nothing is written until the first `emit` or `close`.
    pub fn open(writer: W) -> Self {
        Self { framed_write: FramedWrite::new(writer, ChunkedEncoder::new()) }
    }

    /// Writes `payload` as one chunk and flushes the writer.
    ///
    /// # Errors
    ///
    /// - [`SendError::InvalidArgument`] if `payload` is empty
    /// - [`SendError::Protocol`] if the session is already closed
    /// - [`SendError::Io`] if the writer fails
    pub async fn emit<D: Buf>(&mut self, payload: D) -> Result<(), SendError> {
        self.framed_write.send(PayloadItem::Chunk(payload)).await.inspect_err(|e| {
            if let SendError::Io { .. } = e {
                error!(cause = %e, "failed to write chunk");
            }
        })
    }

    /// Encodes `payload` as one chunk without flushing the writer.
    ///
    /// Queued chunks go out in order with the next `emit`, `flush` or `close`,
    /// or earlier when the write buffer is full.
    pub async fn queue<D: Buf>(&mut self, payload: D) -> Result<(), SendError> {
        self.framed_write.feed(PayloadItem::Chunk(payload)).await
    }

    pub async fn flush(&mut self) -> Result<(), SendError> {
        SinkExt::<PayloadItem<Bytes>>::flush(&mut self.framed_write).await
    }

    /// Writes the terminal frame and flushes the writer.
    ///
    /// # Errors
    ///
    /// - [`SendError::Protocol`] if the session is already closed
    /// - [`SendError::Io`] if the writer fails
    pub async fn close(&mut self) -> Result<(), SendError> {
        self.framed_write.send(PayloadItem::<Bytes>::Eof).await?;

        let encoder = self.framed_write.encoder();
        debug!(chunks = encoder.sent_chunks(), bytes = encoder.sent_bytes(), "finished sending chunked body");
        Ok(())
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.framed_write.encoder().is_finish()
    }

    #[inline]
    pub fn sent_chunks(&self) -> u64 {
        self.framed_write.encoder().sent_chunks()
    }

    #[inline]
    pub fn sent_bytes(&self) -> u64 {
        self.framed_write.encoder().sent_bytes()
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        self.framed_write.get_ref()
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        self.framed_write.get_mut()
    }

    /// Gives the writer back, for example to read the peer's answer on the same connection.
    ///
    /// Chunks queued with [`queue`](Self::queue) and not flushed yet are lost.
    pub fn finish(self) -> W {
        self.framed_write.into_inner()
    }
}
