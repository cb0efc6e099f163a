//! Streaming HTTP/1.1 chunked transfer coding
//!
//! This crate implements both directions of a chunked body as incremental state
//! machines: an encoder that frames payloads as they are produced, and a decoder that
//! rebuilds the peer's chunks from bytes arriving in arbitrary slices. Read boundaries
//! never have to line up with chunk boundaries.
//!
//! # Features
//!
//! - Sans-IO codecs usable with `tokio_util::codec` or a hand written read loop
//! - Push style decoding with [`ChunkedDecoder::feed`](codec::ChunkedDecoder::feed)
//! - Asynchronous sessions over tokio IO for each direction
//! - Chunk extensions and trailers are accepted and skipped
//! - Truncated bodies are reported, never silently cut short
//! - Bounded buffering for size and trailer lines
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use micro_chunked::connection::{BodyReader, EncodeSession};
//! use tokio::net::TcpStream;
//! use tracing::info;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = TcpStream::connect("127.0.0.1:3000").await?;
//!     // request line and headers are written by the caller before the body
//!     let (reader, writer) = stream.into_split();
//!
//!     let upload = tokio::spawn(async move {
//!         let mut session = EncodeSession::open(writer);
//!         for i in 0..3 {
//!             session.emit(Bytes::from(format!("message {i}"))).await?;
//!         }
//!         session.close().await
//!     });
//!
//!     let mut body = BodyReader::new(reader);
//!     for chunk in body.read_to_end().await? {
//!         info!(len = chunk.len(), "received chunk");
//!     }
//!
//!     upload.await??;
//!     Ok(())
//! }
//! ```
//!
//! # Limitations
//!
//! - Only the body is handled: request lines, status lines and headers are up to the caller
//! - No TLS, no HTTP/2
//! - Maximum size or trailer line: 4KB by default

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
