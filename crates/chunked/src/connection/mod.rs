//! Chunked bodies over asynchronous IO.
//!
//! One connection carries two independent directions. Each direction is owned by
//! exactly one of these types, so the two can live on separate tasks without sharing
//! any state:
//!
//! - [`EncodeSession`]: owns the writer, sends chunks as they are produced
//! - [`BodyReader`]: owns the reader, yields chunks as they are complete
//!
//! Neither type retries or reconnects, every failure is returned to the caller.

mod body_reader;
mod encode_session;

pub use body_reader::BodyReader;
pub use body_reader::DEFAULT_READ_CAPACITY;
pub use encode_session::EncodeSession;
