//! Encoder transforms applied to emitted chunks.
//!
//! - [`Encoder`] - Stateless per-chunk binary-to-text transform
//! - [`Base64Encoder`] - Standard base64 with padding (feature `base64`)
//! - [`Encoded`] - Iterator adapter encoding every chunk of a [`ChunkIter`]
//! - `EncodedStream` - Stream adapter encoding every chunk of a `ChunkStream` (feature `async-io`)
//!
//! An encoder processes input in groups of [`Encoder::unit`] bytes. Encoding
//! chunks independently and concatenating the results equals encoding the
//! whole stream at once only if no chunk boundary splits a group, which
//! holds when the target size is a multiple of the unit. The adapters check
//! this when they are built.

#[cfg(feature = "base64")]
mod base64;

#[cfg(feature = "async-io")]
mod stream;

use bytes::Bytes;
use tracing::warn;

use crate::chunk::Chunk;
use crate::chunker::ChunkIter;
use crate::error::ChunkError;
use crate::source::FragmentSource;

#[cfg(feature = "base64")]
pub use self::base64::{BASE64_UNIT, Base64Encoder};

#[cfg(feature = "async-io")]
pub use stream::EncodedStream;

/// A pure, stateless transform from a chunk to its encoded form.
pub trait Encoder {
    /// The number of input bytes the encoder consumes per output group.
    fn unit(&self) -> usize;

    /// Encodes one chunk.
    fn encode(&self, chunk: &[u8]) -> Result<Bytes, ChunkError>;
}

impl<E: Encoder + ?Sized> Encoder for &E {
    fn unit(&self) -> usize {
        (**self).unit()
    }

    fn encode(&self, chunk: &[u8]) -> Result<Bytes, ChunkError> {
        (**self).encode(chunk)
    }
}

/// Checks that chunks of `target_size` bytes never split an encoder group.
pub(crate) fn check_alignment(target_size: usize, unit: usize) -> Result<(), ChunkError> {
    if unit == 0 {
        return Err(ChunkError::InvalidConfig {
            message: "encoder unit must be non-zero",
        });
    }

    if target_size % unit != 0 {
        return Err(ChunkError::InvalidConfig {
            message: "target_size must be a multiple of the encoder unit",
        });
    }

    Ok(())
}

/// An iterator yielding the encoded form of every chunk.
///
/// Chunk count and order are preserved. If the inner iterator or the
/// encoder fails, the error is yielded once, the inner iterator (and with
/// it the upstream source) is dropped and iteration ends.
#[derive(Debug)]
pub struct Encoded<I, E> {
    inner: Option<I>,
    encoder: E,
}

impl<I, E: Encoder> Encoded<I, E> {
    pub(crate) fn new(inner: I, encoder: E, target_size: usize) -> Result<Self, ChunkError> {
        check_alignment(target_size, encoder.unit())?;
        Ok(Self {
            inner: Some(inner),
            encoder,
        })
    }

    /// Returns the encoder.
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Returns the inner iterator, unless it has been dropped after a failure.
    pub fn get_ref(&self) -> Option<&I> {
        self.inner.as_ref()
    }
}

impl<S: FragmentSource, E> Encoded<ChunkIter<S>, E> {
    /// Cancels the underlying chunk stream, releasing its source.
    pub fn cancel(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.cancel();
        }
    }
}

impl<I, E> Iterator for Encoded<I, E>
where
    I: Iterator<Item = Result<Chunk, ChunkError>>,
    E: Encoder,
{
    type Item = Result<Bytes, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;

        let result = match inner.next()? {
            Ok(chunk) => self.encoder.encode(&chunk.data).inspect_err(|e| {
                warn!(error = %e, chunk.offset = chunk.offset, "encoder rejected chunk");
            }),
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.inner = None;
        }
        Some(result)
    }
}
