//! Error types for rechunk.

use thiserror::Error;

/// Errors that can occur while rechunking a byte stream.
///
/// Downstream cancellation is not represented here: cancelling a
/// [`ChunkIter`](crate::ChunkIter) is a normal way to end the sequence.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The upstream source failed while producing a fragment.
    ///
    /// The buffered bytes are discarded and no retry is attempted.
    #[error("upstream read error: {0}")]
    Upstream(#[from] std::io::Error),

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// The encoder transform rejected a chunk.
    #[error("encoding error: {message}")]
    Encoding {
        /// Description reported by the encoder.
        message: String,
    },
}

impl ChunkError {
    /// Returns true if the error was raised by the upstream source.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ChunkError::Upstream(_))
    }
}
