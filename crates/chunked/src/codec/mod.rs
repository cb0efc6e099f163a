//! Codec module for the chunked transfer coding.
//!
//! Both halves are plain state machines over byte buffers. They never touch IO,
//! which keeps them usable with `tokio_util::codec::{FramedRead, FramedWrite}` as well
//! as with any hand written read loop.
//!
//! - [`ChunkedEncoder`]: turns payload buffers into chunk frames and the terminal frame
//! - [`ChunkedDecoder`]: reassembles chunks from bytes split at arbitrary points
//!
//! # Example
//!
//! ```
//! use bytes::{Bytes, BytesMut};
//! use micro_chunked::codec::{ChunkedDecoder, ChunkedEncoder};
//! use micro_chunked::protocol::PayloadItem;
//! use tokio_util::codec::Encoder;
//!
//! let mut encoder = ChunkedEncoder::new();
//! let mut wire = BytesMut::new();
//! encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hi")), &mut wire).unwrap();
//! encoder.encode(PayloadItem::<Bytes>::Eof, &mut wire).unwrap();
//!
//! let mut decoder = ChunkedDecoder::new();
//! let items = wire.chunks(3).flat_map(|slice| decoder.feed(slice).collect::<Vec<_>>()).collect::<Vec<_>>();
//! assert_eq!(items, vec![Ok(PayloadItem::Chunk(Bytes::from_static(b"hi"))), Ok(PayloadItem::Eof)]);
//! ```

mod chunked_decoder;
mod chunked_encoder;
mod grammar;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_decoder::DecoderConfig;
pub use chunked_decoder::Feed;
pub use chunked_decoder::DEFAULT_MAX_LINE_LEN;
pub use chunked_encoder::ChunkedEncoder;
