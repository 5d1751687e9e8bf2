//! Async streaming support for rechunking.
//!
//! This module drives the stage from `futures_core::Stream` sources and
//! `futures_io::AsyncRead` readers, making it runtime-agnostic and
//! compatible with tokio, async-std, smol, and other async runtimes.
//!
//! - [`ChunkStream`] - Stream of fixed-size chunks over a fragment stream
//! - [`ReadFragments`] - Fragment stream over an async reader
//! - [`chunk_async`] - Creates a chunk stream from an async reader
//! - [`chunk_stream`] - Creates a chunk stream from a fragment stream
//!
//! This module requires the `async-io` feature to be enabled.

mod reader;
mod stream;

pub use reader::ReadFragments;
pub use stream::{ChunkStream, chunk_async, chunk_stream};
