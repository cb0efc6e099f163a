use bytes::{Buf, Bytes};

/// Represents an item in a chunked body stream.
///
/// The encoder consumes these to produce frames and the decoder produces them
/// from frames: a `Chunk` is one complete, non-empty chunk of the body, `Eof`
/// stands for the terminal zero-size chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A complete chunk of payload data
    Chunk(Data),
    /// Marks the end of the body stream
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    /// Returns true if this item represents the end of the body stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item contains chunk data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    /// Returns a reference to the contained bytes if this is a Chunk
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the PayloadItem and returns the contained bytes if this is a Chunk
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

impl From<Bytes> for PayloadItem {
    fn from(bytes: Bytes) -> Self {
        Self::Chunk(bytes)
    }
}

/// The externally visible phase of a chunked decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePhase {
    /// Waiting for a complete `size-hex [; extension] CRLF` line
    AwaitingSizeLine,
    /// Inside a chunk body, `remaining` data bytes still to come
    AwaitingChunkData { remaining: u64 },
    /// Chunk body complete, waiting for its closing CRLF
    AwaitingChunkCrlf,
    /// Terminal chunk seen, draining trailers up to the final empty line
    AwaitingTrailingCrlf,
    /// The terminal frame has been fully consumed
    Done,
    /// A fatal error was raised, see [`DecodeError`](crate::protocol::DecodeError)
    Failed,
}

impl DecodePhase {
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, DecodePhase::Done)
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, DecodePhase::Failed)
    }
}
