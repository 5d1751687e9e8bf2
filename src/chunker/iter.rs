//! Synchronous driver - Chunker and ChunkIter.
//!
//! This module drives a [`ChunkBuffer`] from a blocking source. It
//! provides two main types:
//!
//! - [`Chunker`] - Holds a validated configuration and starts chunking operations
//! - [`ChunkIter`] - Iterator that yields fixed-size chunks from a [`FragmentSource`]
//!
//! # Example
//!
//! ```no_run
//! use rechunk::{Chunker, ChunkConfig};
//! use std::fs::File;
//!
//! let file = File::open("attachment.pdf")?;
//! let chunker = Chunker::new(ChunkConfig::new(3 * 1024)?)?;
//!
//! for chunk in chunker.chunk(file) {
//!     let chunk = chunk?;
//!     println!("Chunk: {} bytes @ {}", chunk.len(), chunk.offset);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::{self, Read};
use std::iter::FusedIterator;
use std::num::NonZeroUsize;

use bytes::Bytes;

use crate::chunk::Chunk;
use crate::config::ChunkConfig;
use crate::encode::{Encoded, Encoder};
use crate::error::ChunkError;
use crate::source::{FragmentSource, IterSource, ReaderSource};
use crate::stage::{ChunkBuffer, Signal};

/// Starts rechunking operations with a shared configuration.
///
/// # Example
///
/// ```
/// use rechunk::{Chunker, ChunkConfig};
/// use std::io::Cursor;
///
/// let chunker = Chunker::new(ChunkConfig::new(4)?)?;
/// let chunks: Vec<_> = chunker
///     .chunk(Cursor::new(&b"some data"[..]))
///     .collect::<Result<_, _>>()?;
///
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(&chunks[2].data[..], b"a");
/// # Ok::<(), rechunk::ChunkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Creates a chunker with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: ChunkConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration used by this chunker.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Creates a chunking iterator over a reader.
    ///
    /// The reader is read `read_size` bytes at a time, and only when the
    /// consumer asks for a chunk that is not already buffered.
    pub fn chunk<R: Read>(&self, reader: R) -> ChunkIter<ReaderSource<R>> {
        self.chunk_source(ReaderSource::new(reader, self.config.read_size()))
    }

    /// Creates a chunking iterator over an iterator of fragments.
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::Bytes;
    /// use rechunk::{Chunker, ChunkConfig};
    ///
    /// let fragments = ["ab", "cde", "f"].map(|f| Ok(Bytes::from(f)));
    /// let chunker = Chunker::new(ChunkConfig::new(2)?)?;
    ///
    /// let chunks: Vec<_> = chunker
    ///     .chunk_fragments(fragments)
    ///     .map(|c| c.map(|c| c.data))
    ///     .collect::<Result<_, _>>()?;
    /// assert_eq!(chunks, ["ab", "cd", "ef"]);
    /// # Ok::<(), rechunk::ChunkError>(())
    /// ```
    pub fn chunk_fragments<I>(&self, fragments: I) -> ChunkIter<IterSource<I::IntoIter>>
    where
        I: IntoIterator<Item = io::Result<Bytes>>,
    {
        self.chunk_source(IterSource::new(fragments))
    }

    /// Creates a chunking iterator over any fragment source.
    pub fn chunk_source<S: FragmentSource>(&self, source: S) -> ChunkIter<S> {
        ChunkIter::from_parts(source, ChunkBuffer::with_target(self.target()))
    }

    /// Chunks an in-memory buffer.
    ///
    /// Chunks are zero-copy slices of `data`.
    ///
    /// # Example
    ///
    /// ```
    /// use rechunk::{Chunker, ChunkConfig};
    ///
    /// let chunker = Chunker::new(ChunkConfig::new(3)?)?;
    /// let chunks = chunker.chunk_bytes(&b"abcde"[..]);
    ///
    /// assert_eq!(chunks.len(), 2);
    /// assert_eq!(chunks[1].offset, 3);
    /// # Ok::<(), rechunk::ChunkError>(())
    /// ```
    pub fn chunk_bytes(&self, data: impl Into<Bytes>) -> Vec<Chunk> {
        let data = data.into();
        let target = self.target().get();

        (0..data.len())
            .step_by(target)
            .map(|start| {
                let end = (start + target).min(data.len());
                Chunk::new(data.slice(start..end), start as u64)
            })
            .collect()
    }

    fn target(&self) -> NonZeroUsize {
        // Validated in `new`.
        NonZeroUsize::new(self.config.target_size()).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkConfig::default(),
        }
    }
}

/// An iterator that yields fixed-size chunks from a fragment source.
///
/// Each call to [`Iterator::next`] is one unit of downstream demand. The
/// source is pulled only when the buffered bytes cannot satisfy it, one
/// fragment at a time. The source is released when the stream completes,
/// fails or is cancelled.
///
/// After an error has been yielded the iterator returns `None`.
#[derive(Debug)]
pub struct ChunkIter<S> {
    source: S,
    stage: ChunkBuffer,
}

impl<S: FragmentSource> ChunkIter<S> {
    /// Creates an iterator over `source` using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if the configuration is invalid.
    pub fn new(source: S, config: &ChunkConfig) -> Result<Self, ChunkError> {
        Ok(Self::from_parts(source, ChunkBuffer::from_config(config)?))
    }

    fn from_parts(source: S, stage: ChunkBuffer) -> Self {
        Self { source, stage }
    }

    /// Cancels the stream.
    ///
    /// Buffered bytes are dropped without being emitted, the source is
    /// released and no further fragments are pulled. Subsequent calls to
    /// `next` return `None`.
    pub fn cancel(&mut self) {
        self.stage.on_cancel();
        self.source.release();
    }

    /// Returns the underlying stage.
    pub fn stage(&self) -> &ChunkBuffer {
        &self.stage
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the target chunk size.
    pub fn target_size(&self) -> usize {
        self.stage.target_size()
    }

    /// Maps every chunk through `encoder`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if the target size is not a
    /// multiple of the encoder's unit, since chunk boundaries would then
    /// split encoder groups.
    pub fn encode<E: Encoder>(self, encoder: E) -> Result<Encoded<Self, E>, ChunkError> {
        let target_size = self.target_size();
        Encoded::new(self, encoder, target_size)
    }
}

impl<S: FragmentSource> Iterator for ChunkIter<S> {
    type Item = Result<Chunk, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut signal = self.stage.on_demand();

        loop {
            signal = match signal {
                Signal::Emit(chunk) => {
                    if self.stage.is_terminated() {
                        self.source.release();
                    }
                    return Some(Ok(chunk));
                }
                Signal::Pull => match self.source.pull() {
                    Some(Ok(fragment)) => self.stage.on_fragment(fragment),
                    Some(Err(e)) => self.stage.on_upstream_failure(e),
                    None => self.stage.on_upstream_end(),
                },
                Signal::Failed(e) => {
                    self.source.release();
                    return Some(Err(e));
                }
                // Pulls resolve before returning here, so waiting means done.
                Signal::Idle | Signal::Complete => {
                    self.source.release();
                    return None;
                }
            };
        }
    }
}

impl<S: FragmentSource> FusedIterator for ChunkIter<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_chunker_empty() {
        let chunker = Chunker::default();
        assert!(chunker.chunk_bytes(&b""[..]).is_empty());

        let mut iter = chunker.chunk(Cursor::new(Vec::new()));
        assert!(iter.next().is_none());
        assert!(iter.source().is_released());
    }

    #[test]
    fn test_chunker_rejects_invalid_config() {
        let config = ChunkConfig::default().with_target_size(0);
        assert!(Chunker::new(config).is_err());
        assert!(ChunkIter::new(IterSource::new(Vec::new()), &config).is_err());
    }

    #[test]
    fn test_chunk_bytes_matches_iterator() {
        let data: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
        let chunker = Chunker::new(ChunkConfig::new(64).unwrap().with_read_size(100)).unwrap();

        let direct = chunker.chunk_bytes(data.clone());
        let streamed: Vec<_> = chunker
            .chunk(Cursor::new(&data))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(direct, streamed);
        assert_eq!(direct.len(), 16);
        assert_eq!(direct.last().unwrap().len(), 1000 - 15 * 64);
    }

    #[test]
    fn test_chunk_offsets() {
        let data: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
        let chunker = Chunker::new(ChunkConfig::new(48).unwrap().with_read_size(7)).unwrap();

        let mut expected_offset = 0u64;
        for chunk in chunker.chunk(Cursor::new(&data)) {
            let chunk = chunk.unwrap();
            assert_eq!(chunk.offset, expected_offset);
            expected_offset = chunk.end();
        }
        assert_eq!(expected_offset, data.len() as u64);
    }

    #[test]
    fn test_cancel_releases_reader() {
        let chunker = Chunker::new(ChunkConfig::new(2).unwrap().with_read_size(3)).unwrap();
        let mut iter = chunker.chunk(Cursor::new(b"abcdef".to_vec()));

        assert_eq!(&iter.next().unwrap().unwrap().data[..], b"ab");
        assert_eq!(iter.stage().buffered_len(), 1);

        iter.cancel();
        assert!(iter.source().is_released());
        assert_eq!(iter.stage().buffered_len(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_error_ends_iteration() {
        let fragments = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")),
            Ok(Bytes::from_static(b"never")),
        ];
        let chunker = Chunker::new(ChunkConfig::new(2).unwrap()).unwrap();
        let mut iter = chunker.chunk_fragments(fragments);

        assert_eq!(&iter.next().unwrap().unwrap().data[..], b"ab");
        assert!(matches!(iter.next(), Some(Err(ChunkError::Upstream(_)))));
        assert!(iter.source().is_released());
        assert!(iter.next().is_none());
    }
}
