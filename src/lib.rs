//! rechunk
//!
//! Backpressure-aware fixed-size rechunking of byte streams.
//!
//! `rechunk` takes an upstream byte source that delivers fragments of
//! arbitrary, uncontrolled size and re-emits a lazy sequence of chunks of
//! one fixed target size (the last chunk may be shorter). It is designed
//! as a small, composable primitive for:
//!
//! - feeding size-sensitive encoders (base64 works on 3-byte groups)
//! - chunked HTTP download bodies
//! - serving attachments much larger than available memory
//!
//! The crate intentionally:
//! - does NOT manage files, paths or storage
//! - does NOT spawn tasks or threads
//! - does NOT retry failed reads
//! - does NOT read ahead of demand
//!
//! It only does one thing: **Fragments in → aligned chunks out, on demand**
//!
//! Memory is bounded by the target size plus one in-flight fragment, since
//! upstream is asked for exactly one fragment at a time and only when the
//! consumer wants a chunk that is not already buffered.
//!
//! # Sync
//!
//! ```no_run
//! use std::fs::File;
//! use rechunk::{Chunker, ChunkConfig, ChunkError};
//!
//! fn main() -> Result<(), ChunkError> {
//!     let file = File::open("data.bin")?;
//!     let chunker = Chunker::new(ChunkConfig::default())?;
//!
//!     for chunk in chunker.chunk(file) {
//!         let chunk = chunk?;
//!         println!("chunk {} bytes", chunk.data.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use rechunk::{chunk_async, ChunkConfig};
//! use futures_io::AsyncRead;
//!
//! async fn demo<R: AsyncRead + Unpin>(reader: R) -> Result<(), rechunk::ChunkError> {
//!     let mut stream = chunk_async(reader, ChunkConfig::default())?;
//!
//!     while let Some(chunk) = stream.next().await {
//!         let chunk = chunk?;
//!         println!("chunk {}", chunk.data.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Stage
//!
//! Both drivers are thin loops around [`ChunkBuffer`], an explicit state
//! machine with no I/O of its own. Custom runtimes can drive it directly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod chunker;
mod config;
mod encode;
mod error;
mod response;
mod source;
mod stage;

mod util; // internal helpers

#[cfg(feature = "async-io")]
mod async_stream;

//
// Public surface
//

pub use chunk::Chunk;
pub use chunker::{ChunkIter, Chunker};
pub use config::{ChunkConfig, DEFAULT_READ_SIZE, DEFAULT_TARGET_CHUNK_SIZE};
pub use encode::{Encoded, Encoder};
pub use error::ChunkError;
pub use response::{Attachment, Base64Response};
pub use source::{FragmentSource, IterSource, ReaderSource};
pub use stage::{ChunkBuffer, DemandState, Signal, UpstreamState};

#[cfg(feature = "base64")]
pub use encode::{BASE64_UNIT, Base64Encoder};
#[cfg(feature = "base64")]
pub use response::base64_response;

#[cfg(feature = "async-io")]
pub use async_stream::{ChunkStream, ReadFragments, chunk_async, chunk_stream};
#[cfg(feature = "async-io")]
pub use encode::EncodedStream;
#[cfg(all(feature = "base64", feature = "async-io"))]
pub use response::base64_response_async;
