//! Async counterpart of [`Encoded`](super::Encoded).

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_core::Stream;
use tracing::warn;

use super::{Encoder, check_alignment};
use crate::async_stream::ChunkStream;
use crate::chunk::Chunk;
use crate::error::ChunkError;

/// A stream yielding the encoded form of every chunk.
///
/// Behaves like [`Encoded`](super::Encoded): order and count are preserved,
/// and the first failure is yielded once before the inner stream is
/// dropped.
#[derive(Debug)]
pub struct EncodedStream<S, E> {
    inner: Option<S>,
    encoder: E,
}

impl<S, E: Encoder> EncodedStream<S, E> {
    pub(crate) fn new(inner: S, encoder: E, target_size: usize) -> Result<Self, ChunkError> {
        check_alignment(target_size, encoder.unit())?;
        Ok(Self {
            inner: Some(inner),
            encoder,
        })
    }

    /// Returns the inner stream, unless it has been dropped after a failure.
    pub fn get_ref(&self) -> Option<&S> {
        self.inner.as_ref()
    }
}

impl<S, E> EncodedStream<ChunkStream<S>, E> {
    /// Cancels the underlying chunk stream, releasing its source.
    pub fn cancel(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            inner.cancel();
        }
    }
}

impl<S, E> Stream for EncodedStream<S, E>
where
    S: Stream<Item = Result<Chunk, ChunkError>> + Unpin,
    E: Encoder + Unpin,
{
    type Item = Result<Bytes, ChunkError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        let result = match ready!(Pin::new(inner).poll_next(cx)) {
            None => return Poll::Ready(None),
            Some(Ok(chunk)) => this.encoder.encode(&chunk.data).inspect_err(|e| {
                warn!(error = %e, chunk.offset = chunk.offset, "encoder rejected chunk");
            }),
            Some(Err(e)) => Err(e),
        };

        if result.is_err() {
            this.inner = None;
        }
        Poll::Ready(Some(result))
    }
}
