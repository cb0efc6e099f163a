use http::StatusCode;
use micro_chunked::protocol::{ParseError, SendError};
use std::io;
use thiserror::Error;

/// Errors raised while building a [`Client`](crate::Client).
#[derive(Error, Debug)]
pub enum ClientBuildError {
    #[error("address must be set")]
    MissingAddress,

    #[error("address resolved to no socket address")]
    EmptyAddress,

    #[error("invalid address: {source}")]
    InvalidAddress {
        #[source]
        source: io::Error,
    },
}

/// Errors raised by an upload or a download.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connect error: {source}")]
    Connect {
        #[source]
        source: io::Error,
    },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("invalid response head: {reason}")]
    InvalidHead { reason: String },

    #[error("response head size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHead { current_size: usize, max_size: usize },

    #[error("response header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("connection closed before the response head was complete")]
    ClosedBeforeHead,

    #[error("response body is not chunked, status: {status}")]
    NotChunked { status: StatusCode },

    #[error("receive error: {source}")]
    Receive {
        #[from]
        source: ParseError,
    },

    #[error("send error: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ClientError {
    pub fn connect(source: io::Error) -> Self {
        Self::Connect { source }
    }

    pub fn invalid_request<S: ToString>(str: S) -> Self {
        Self::InvalidRequest { reason: str.to_string() }
    }

    pub fn invalid_head<S: ToString>(str: S) -> Self {
        Self::InvalidHead { reason: str.to_string() }
    }

    pub fn too_large_head(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHead { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn not_chunked(status: StatusCode) -> Self {
        Self::NotChunked { status }
    }
}
