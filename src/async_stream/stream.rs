//! Async stream driver for the rechunking stage.
//!
//! Each call to `poll_next` is one unit of downstream demand. While a
//! fragment request is pending upstream, re-polling does not issue a new
//! request: the stage coalesces the duplicate demand and the same upstream
//! poll is resumed.
//!
//! # Example
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
//!         println!("Chunk: {} bytes", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use futures_core::stream::FusedStream;
use futures_io::AsyncRead;

use super::reader::ReadFragments;
use crate::chunk::Chunk;
use crate::config::ChunkConfig;
use crate::encode::{EncodedStream, Encoder};
use crate::error::ChunkError;
use crate::stage::{ChunkBuffer, Signal};

/// A stream that yields fixed-size chunks from a stream of fragments.
///
/// The source is dropped when the stream completes, fails or is cancelled.
/// After an error has been yielded the stream ends.
#[derive(Debug)]
pub struct ChunkStream<S> {
    source: Option<S>,
    stage: ChunkBuffer,
}

impl<S> ChunkStream<S> {
    /// Creates a chunk stream over `source` using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if the configuration is invalid.
    pub fn new(source: S, config: &ChunkConfig) -> Result<Self, ChunkError> {
        Ok(Self {
            source: Some(source),
            stage: ChunkBuffer::from_config(config)?,
        })
    }

    /// Cancels the stream.
    ///
    /// Buffered bytes are dropped without being emitted and the source is
    /// dropped, closing any handle it holds. Subsequent polls yield `None`.
    pub fn cancel(&mut self) {
        self.stage.on_cancel();
        self.source = None;
    }

    /// Returns true once the source has been dropped.
    pub fn is_released(&self) -> bool {
        self.source.is_none()
    }

    /// Returns the underlying stage.
    pub fn stage(&self) -> &ChunkBuffer {
        &self.stage
    }

    /// Maps every chunk through `encoder`.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if the target size is not a
    /// multiple of the encoder's unit.
    pub fn encode<E: Encoder>(self, encoder: E) -> Result<EncodedStream<Self, E>, ChunkError> {
        let target_size = self.stage.target_size();
        EncodedStream::new(self, encoder, target_size)
    }
}

impl<S> Stream for ChunkStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = Result<Chunk, ChunkError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let mut signal = this.stage.on_demand();

        loop {
            signal = match signal {
                Signal::Emit(chunk) => {
                    if this.stage.is_terminated() {
                        this.source = None;
                    }
                    return Poll::Ready(Some(Ok(chunk)));
                }
                Signal::Pull | Signal::Idle => {
                    let Some(source) = this.source.as_mut() else {
                        return Poll::Ready(None);
                    };
                    match Pin::new(source).poll_next(cx) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(Some(Ok(fragment))) => this.stage.on_fragment(fragment),
                        Poll::Ready(Some(Err(e))) => this.stage.on_upstream_failure(e),
                        Poll::Ready(None) => this.stage.on_upstream_end(),
                    }
                }
                Signal::Failed(e) => {
                    this.source = None;
                    return Poll::Ready(Some(Err(e)));
                }
                Signal::Complete => {
                    this.source = None;
                    return Poll::Ready(None);
                }
            };
        }
    }
}

impl<S> FusedStream for ChunkStream<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.stage.is_terminated()
    }
}

/// Creates a chunk stream from an async reader.
///
/// Uses `futures_io::AsyncRead` for runtime-agnostic async I/O. The reader
/// is read `read_size` bytes at a time.
///
/// # Runtime Compatibility
///
/// For tokio users, you can use `tokio_util::compat` to convert
/// `tokio::io::AsyncRead` to `futures_io::AsyncRead`:
///
/// ```ignore
/// use tokio_util::compat::TokioAsyncReadCompatExt;
/// use rechunk::{chunk_async, ChunkConfig};
///
/// let tokio_reader = tokio::fs::File::open("file").await?;
/// let stream = chunk_async(tokio_reader.compat(), ChunkConfig::default())?;
/// ```
pub fn chunk_async<R>(
    reader: R,
    config: ChunkConfig,
) -> Result<ChunkStream<ReadFragments<R>>, ChunkError>
where
    R: AsyncRead + Unpin,
{
    ChunkStream::new(ReadFragments::new(reader, config.read_size()), &config)
}

/// Creates a chunk stream from a stream of fragments.
pub fn chunk_stream<S>(stream: S, config: ChunkConfig) -> Result<ChunkStream<S>, ChunkError>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    ChunkStream::new(stream, &config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use futures_util::StreamExt;
    use tokio_test::{assert_pending, assert_ready, task};

    /// Fragment stream that stays pending until its gate opens.
    struct Gated {
        fragments: VecDeque<Bytes>,
        open: Arc<AtomicBool>,
        delivered: Arc<AtomicUsize>,
    }

    impl Gated {
        fn new(fragments: &[&'static str]) -> (Self, Arc<AtomicBool>, Arc<AtomicUsize>) {
            let open = Arc::new(AtomicBool::new(false));
            let delivered = Arc::new(AtomicUsize::new(0));
            let gated = Self {
                fragments: fragments.iter().map(|f| Bytes::from_static(f.as_bytes())).collect(),
                open: open.clone(),
                delivered: delivered.clone(),
            };
            (gated, open, delivered)
        }
    }

    impl Stream for Gated {
        type Item = io::Result<Bytes>;

        fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            if !self.open.load(Ordering::SeqCst) {
                return Poll::Pending;
            }
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(self.fragments.pop_front().map(Ok))
        }
    }

    #[tokio::test]
    async fn test_chunk_stream_empty() {
        let reader: &[u8] = &[];
        let stream = chunk_async(reader, ChunkConfig::default()).unwrap();
        let chunks: Vec<_> = stream.collect().await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_chunk_stream_small_reads() {
        let data: Vec<u8> = (0..100).collect();
        let reader: &[u8] = &data;
        let config = ChunkConfig::new(16).unwrap().with_read_size(7);
        let stream = chunk_async(reader, config).unwrap();

        let chunks: Vec<_> = stream.collect().await;
        let chunks: Vec<Chunk> = chunks.into_iter().collect::<Result<_, _>>().unwrap();

        assert_eq!(chunks.len(), 7);
        assert!(chunks[..6].iter().all(|c| c.len() == 16));
        assert_eq!(chunks[6].len(), 4);
        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn test_repoll_while_pending_is_coalesced() {
        let (gated, open, delivered) = Gated::new(&["abc", "d"]);
        let config = ChunkConfig::new(2).unwrap();
        let mut stream = task::spawn(chunk_stream(gated, config).unwrap());

        assert_pending!(stream.poll_next());
        assert_pending!(stream.poll_next());
        assert_pending!(stream.poll_next());
        assert_eq!(delivered.load(Ordering::SeqCst), 0);

        open.store(true, Ordering::SeqCst);
        let chunk = assert_ready!(stream.poll_next()).unwrap().unwrap();
        assert_eq!(&chunk.data[..], b"ab");
        assert_eq!(delivered.load(Ordering::SeqCst), 1);

        let chunk = assert_ready!(stream.poll_next()).unwrap().unwrap();
        assert_eq!(&chunk.data[..], b"cd");
        let chunk = assert_ready!(stream.poll_next());
        assert!(chunk.is_none());
        assert_eq!(delivered.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancel_releases_source() {
        let (gated, open, delivered) = Gated::new(&["abcd", "efgh"]);
        open.store(true, Ordering::SeqCst);
        let mut stream = chunk_stream(gated, ChunkConfig::new(3).unwrap()).unwrap();

        let mut spawned = task::spawn(&mut stream);
        assert!(assert_ready!(spawned.poll_next()).unwrap().is_ok());
        drop(spawned);

        stream.cancel();
        assert!(stream.is_released());
        assert!(FusedStream::is_terminated(&stream));

        let mut spawned = task::spawn(&mut stream);
        assert!(assert_ready!(spawned.poll_next()).is_none());
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_terminates() {
        let fragments = futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"a")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let mut stream = chunk_stream(fragments, ChunkConfig::new(4).unwrap()).unwrap();

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.is_upstream());
        assert!(stream.is_released());
        assert!(stream.next().await.is_none());
    }
}
