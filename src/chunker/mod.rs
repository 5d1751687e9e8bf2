//! Synchronous rechunking.
//!
//! - [`Chunker`] - Configures and starts chunking operations
//! - [`ChunkIter`] - Pull iterator driving the stage from a fragment source

mod iter;

pub use iter::{ChunkIter, Chunker};
