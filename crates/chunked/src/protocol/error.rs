use std::io;
use thiserror::Error;

use crate::protocol::DecodePhase;

/// Errors raised by the chunked decoder state machine.
///
/// Every variant is fatal for the body it was raised on. The decoder keeps a copy of
/// the error and hands it back on every later call, so the type is `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed chunk size line: {reason} (after {consumed} bytes)")]
    MalformedChunkSize { reason: String, consumed: u64 },

    #[error("malformed chunk data: {reason} (after {consumed} bytes)")]
    MalformedChunkData { reason: String, consumed: u64 },

    #[error("malformed trailer: {reason} (after {consumed} bytes)")]
    MalformedTrailer { reason: String, consumed: u64 },

    #[error("chunk size {size} exceed the limit {limit} (after {consumed} bytes)")]
    ChunkTooLarge { size: u64, limit: u64, consumed: u64 },

    #[error("stream closed while {phase:?} (after {consumed} bytes)")]
    TruncatedStream { phase: DecodePhase, consumed: u64 },
}

impl DecodeError {
    pub fn malformed_chunk_size<S: ToString>(str: S, consumed: u64) -> Self {
        Self::MalformedChunkSize { reason: str.to_string(), consumed }
    }

    pub fn malformed_chunk_data<S: ToString>(str: S, consumed: u64) -> Self {
        Self::MalformedChunkData { reason: str.to_string(), consumed }
    }

    pub fn malformed_trailer<S: ToString>(str: S, consumed: u64) -> Self {
        Self::MalformedTrailer { reason: str.to_string(), consumed }
    }

    pub fn chunk_too_large(size: u64, limit: u64, consumed: u64) -> Self {
        Self::ChunkTooLarge { size, limit, consumed }
    }

    pub fn truncated_stream(phase: DecodePhase, consumed: u64) -> Self {
        Self::TruncatedStream { phase, consumed }
    }

    /// The phase the decoder was in when the error was raised.
    pub fn phase(&self) -> DecodePhase {
        match self {
            Self::MalformedChunkSize { .. } | Self::ChunkTooLarge { .. } => DecodePhase::AwaitingSizeLine,
            Self::MalformedChunkData { .. } => DecodePhase::AwaitingChunkCrlf,
            Self::MalformedTrailer { .. } => DecodePhase::AwaitingTrailingCrlf,
            Self::TruncatedStream { phase, .. } => *phase,
        }
    }

    /// Number of bytes the decoder consumed from the stream before the error.
    pub fn consumed(&self) -> u64 {
        match self {
            Self::MalformedChunkSize { consumed, .. }
            | Self::MalformedChunkData { consumed, .. }
            | Self::MalformedTrailer { consumed, .. }
            | Self::ChunkTooLarge { consumed, .. }
            | Self::TruncatedStream { consumed, .. } => *consumed,
        }
    }

    #[inline]
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedStream { .. })
    }
}

/// Errors on the receiving direction: either the body is malformed or the transport failed.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("decode error: {source}")]
    Decode {
        #[from]
        source: DecodeError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns the decoder error, if this is not a transport failure.
    pub fn as_decode_error(&self) -> Option<&DecodeError> {
        match self {
            Self::Decode { source } => Some(source),
            Self::Io { .. } => None,
        }
    }
}

/// Errors on the sending direction.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("protocol error: {reason}")]
    Protocol { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_argument<S: ToString>(str: S) -> Self {
        Self::InvalidArgument { reason: str.to_string() }
    }

    pub fn protocol<S: ToString>(str: S) -> Self {
        Self::Protocol { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    #[inline]
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}
