use crate::codec::ChunkedDecoder;
use crate::protocol::{DecodeError, DecodePhase, ParseError, PayloadItem};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, error};

/// Initial capacity of the read buffer.
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

/// The receiving half of a chunked body.
///
/// Reads from the transport only when the decoder needs more bytes and yields every
/// chunk as soon as it is complete, then a single [`PayloadItem::Eof`]. The stream ends
/// right after `Eof` without reading any further, so a transport that stays open after
/// the body does not block the consumer. A transport closed before the terminal frame
/// yields [`DecodeError::TruncatedStream`].
///
/// Once decoding or reading failed, every later poll yields that failure again, the
/// stream never ends short of `Eof` without an error.
#[derive(Debug)]
pub struct BodyReader<R> {
    framed_read: FramedRead<R, ChunkedDecoder>,
    /// transport failure, kept to be reported again
    io_error: Option<io::Error>,
}

impl<R> BodyReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_READ_CAPACITY)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self::with_decoder(reader, ChunkedDecoder::new(), capacity)
    }

    /// Uses a preconfigured decoder, see [`DecoderConfig`](crate::codec::DecoderConfig).
    pub fn with_decoder(reader: R, decoder: ChunkedDecoder, capacity: usize) -> Self {
        Self { framed_read: FramedRead::with_capacity(reader, decoder, capacity), io_error: None }
    }

    #[inline]
    pub fn phase(&self) -> DecodePhase {
        self.framed_read.decoder().phase()
    }

    #[inline]
    pub fn decoder(&self) -> &ChunkedDecoder {
        self.framed_read.decoder()
    }

    #[inline]
    pub fn get_ref(&self) -> &R {
        self.framed_read.get_ref()
    }

    /// Gives the reader back. Bytes already read but not decoded are lost.
    pub fn into_inner(self) -> R {
        self.framed_read.into_inner()
    }

    /// The failure that ended the body, if any.
    pub fn error(&self) -> Option<ParseError> {
        if let Some(e) = self.framed_read.decoder().error() {
            return Some(e.clone().into());
        }
        self.io_error.as_ref().map(|e| ParseError::io(io::Error::new(e.kind(), e.to_string())))
    }

    /// Reads the rest of the body, returning its chunks in order.
    ///
    /// Returns no chunk if the body was already read to its end.
    pub async fn read_to_end(&mut self) -> Result<Vec<Bytes>, ParseError> {
        let mut chunks = vec![];

        while let Some(item) = self.next().await {
            match item {
                Ok(PayloadItem::Chunk(bytes)) => chunks.push(bytes),
                Ok(PayloadItem::Eof) => {
                    debug!(chunks = chunks.len(), consumed = self.decoder().consumed(), "finished reading chunked body");
                    return Ok(chunks);
                }
                Err(e) => {
                    error!(cause = %e, phase = ?self.phase(), "failed to read chunked body");
                    return Err(e);
                }
            }
        }

        Ok(chunks)
    }
}

impl<R> Stream for BodyReader<R>
where
    R: AsyncRead + Unpin,
{
    type Item = Result<PayloadItem, ParseError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.framed_read.decoder().is_done() {
            return Poll::Ready(None);
        }
        if let Some(e) = this.error() {
            return Poll::Ready(Some(Err(e)));
        }

        match ready!(Pin::new(&mut this.framed_read).poll_next(cx)) {
            Some(Err(ParseError::Io { source })) => {
                this.io_error = Some(io::Error::new(source.kind(), source.to_string()));
                Poll::Ready(Some(Err(ParseError::io(source))))
            }
            Some(item) => Poll::Ready(Some(item)),
            None => {
                // the decoder reports truncation itself, this only guards the framing contract
                let decoder = this.framed_read.decoder();
                let error = DecodeError::truncated_stream(decoder.phase(), decoder.consumed());
                Poll::Ready(Some(Err(error.into())))
            }
        }
    }
}
