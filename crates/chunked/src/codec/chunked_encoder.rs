use crate::codec::grammar::{self, CRLF, LAST_CHUNK};
use crate::ensure;
use crate::protocol::{PayloadItem, SendError};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::trace;

/// Encoder for HTTP chunked transfer encoding.
///
/// Every `PayloadItem::Chunk` becomes one `size CRLF data CRLF` frame, `PayloadItem::Eof`
/// becomes the terminal `0 CRLF CRLF` frame. Empty chunks are rejected, an empty frame
/// would read as the terminal one. Nothing can be encoded after the terminal frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    sent_chunks: u64,
    sent_bytes: u64,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the terminal frame has been encoded.
    #[inline]
    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Number of data chunks encoded so far.
    #[inline]
    pub fn sent_chunks(&self) -> u64 {
        self.sent_chunks
    }

    /// Number of payload bytes encoded so far, framing excluded.
    #[inline]
    pub fn sent_bytes(&self) -> u64 {
        self.sent_bytes
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PayloadItem::Chunk(bytes) => {
                ensure!(!self.eof, SendError::protocol("can't send chunk after the last chunk"));
                ensure!(bytes.has_remaining(), SendError::invalid_argument("empty chunk, send eof to end the body"));

                let len = bytes.remaining();
                grammar::put_size_line(dst, len)?;
                dst.reserve(len + CRLF.len());
                dst.put(bytes);
                dst.put_slice(CRLF);

                self.sent_chunks += 1;
                self.sent_bytes += len as u64;
                trace!(len, "encode chunk");
                Ok(())
            }
            PayloadItem::Eof => {
                ensure!(!self.eof, SendError::protocol("the last chunk has already been sent"));

                self.eof = true;
                dst.extend_from_slice(LAST_CHUNK);
                trace!(chunks = self.sent_chunks, bytes = self.sent_bytes, "encode last chunk");
                Ok(())
            }
        }
    }
}
