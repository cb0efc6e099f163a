//! Chunked uploads and downloads over plain TCP
//!
//! A thin HTTP/1.1 client built on `micro-chunked`. It writes just enough of a request
//! to start a chunked body, reads just enough of a response to get to one, and hands
//! the body to the chunked sessions. Uploads and downloads use separate connections,
//! so both directions can run side by side.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use micro_chunked_client::Client;
//! use tracing::info;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder().address("127.0.0.1:3000").build()?;
//!
//!     let mut upload = client.upload("/test/concurrence").await?;
//!     upload.emit(Bytes::from_static(b"hello")).await?;
//!     let response = upload.finish().await?;
//!     info!(status = %response.status(), "uploaded");
//!
//!     let mut download = client.download("/test/concurrence").await?;
//!     while let Some(chunk) = download.next_chunk().await? {
//!         info!(len = chunk.len(), "received chunk");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Limitations
//!
//! - No TLS, no redirects, no connection reuse
//! - Response bodies of uploads are not read
//! - Maximum number of response headers: 64
//! - Maximum response head size: 8KB

mod client;
mod error;
mod head;
mod transfer;

pub use client::{Client, ClientBuilder};
pub use error::{ClientBuildError, ClientError};
pub use head::{RequestHead, ResponseHead, ResponseHeadDecoder};
pub use transfer::{Download, Upload, start_download, start_upload};
