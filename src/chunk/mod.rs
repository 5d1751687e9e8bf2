//! Chunk types.
//!
//! - [`Chunk`] - Fixed-size chunk with data and stream offset

mod data;

pub use data::Chunk;
