//! ChunkBuffer - the backpressure state machine.
//!
//! Memory held by the stage is bounded by the target size plus the one
//! fragment in flight: upstream is only asked for a fragment while the
//! buffer holds less than a full chunk, downstream has asked for a chunk,
//! and no other request is outstanding.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use rechunk::{ChunkBuffer, Signal};
//!
//! let mut stage = ChunkBuffer::new(2)?;
//!
//! assert!(matches!(stage.on_demand(), Signal::Pull));
//! // Duplicate demand while the pull is outstanding is coalesced.
//! assert!(matches!(stage.on_demand(), Signal::Idle));
//!
//! match stage.on_fragment(Bytes::from_static(b"abc")) {
//!     Signal::Emit(chunk) => assert_eq!(&chunk.data[..], b"ab"),
//!     other => panic!("unexpected {other:?}"),
//! }
//!
//! assert!(matches!(stage.on_upstream_end(), Signal::Idle));
//! match stage.on_demand() {
//!     Signal::Emit(chunk) => assert_eq!(&chunk.data[..], b"c"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert!(matches!(stage.on_demand(), Signal::Complete));
//! # Ok::<(), rechunk::ChunkError>(())
//! ```

use std::num::NonZeroUsize;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::chunk::Chunk;
use crate::config::ChunkConfig;
use crate::error::ChunkError;

/// Whether more fragments may arrive from upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamState {
    /// More fragments may arrive.
    Open,
    /// Upstream signalled end of stream.
    Ended,
    /// Upstream failed; the stage has terminated.
    Failed,
}

/// Whether downstream is waiting for the next chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandState {
    /// No chunk has been asked for since the last emission.
    None,
    /// Downstream asked for a chunk that has not been delivered yet.
    Pending,
}

/// The action a driver must take after calling into the stage.
#[derive(Debug)]
#[must_use]
pub enum Signal {
    /// Deliver this chunk downstream. Demand is satisfied.
    Emit(Chunk),
    /// Request exactly one fragment from upstream and report the outcome
    /// through `on_fragment`, `on_upstream_end` or `on_upstream_failure`.
    Pull,
    /// Nothing to do until the outstanding upstream request resolves, or
    /// until downstream demands a chunk.
    Idle,
    /// The stream is finished. No more chunks will be emitted.
    Complete,
    /// The stream failed. No more chunks will be emitted.
    Failed(ChunkError),
}

/// Demand-driven rechunking stage.
///
/// `ChunkBuffer` accepts upstream fragments of arbitrary size and emits
/// chunks of exactly `target_size` bytes, except for a final shorter chunk
/// holding whatever is left when upstream ends. Chunk contents concatenate
/// back to the upstream bytes in arrival order.
///
/// The stage only talks to upstream when downstream has expressed demand,
/// and never has more than one upstream request outstanding.
#[derive(Debug)]
pub struct ChunkBuffer {
    target_size: usize,
    buffer: BytesMut,
    upstream: UpstreamState,
    demand: DemandState,
    outstanding: bool,
    terminated: bool,
    offset: u64,
}

impl ChunkBuffer {
    /// Creates a stage emitting chunks of `target_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidConfig`] if `target_size` is zero.
    pub fn new(target_size: usize) -> Result<Self, ChunkError> {
        let target_size = NonZeroUsize::new(target_size).ok_or(ChunkError::InvalidConfig {
            message: "target_size must be non-zero",
        })?;
        Ok(Self::with_target(target_size))
    }

    /// Creates a stage from a configuration, validating it first.
    pub fn from_config(config: &ChunkConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Self::new(config.target_size())
    }

    pub(crate) fn with_target(target_size: NonZeroUsize) -> Self {
        let target_size = target_size.get();
        debug!(target_size, "chunk buffer created");

        Self {
            target_size,
            buffer: BytesMut::new(),
            upstream: UpstreamState::Open,
            demand: DemandState::None,
            outstanding: false,
            terminated: false,
            offset: 0,
        }
    }

    /// Downstream is ready for the next chunk.
    ///
    /// Emits a full chunk if one is buffered. Otherwise asks for a fragment
    /// unless a request is already outstanding, in which case the demand is
    /// coalesced into the pending one. Once upstream has ended, emits the
    /// remainder as the final chunk, then reports completion on every
    /// further call.
    pub fn on_demand(&mut self) -> Signal {
        if self.terminated {
            return Signal::Complete;
        }
        self.demand = DemandState::Pending;
        self.advance()
    }

    /// Upstream delivered a fragment in answer to a [`Signal::Pull`].
    ///
    /// Fragments arriving after the stage terminated are dropped.
    pub fn on_fragment(&mut self, fragment: Bytes) -> Signal {
        if self.terminated {
            trace!(
                fragment.bytes = fragment.len(),
                "dropping fragment after termination"
            );
            return Signal::Complete;
        }

        self.outstanding = false;
        self.buffer.extend_from_slice(&fragment);
        trace!(
            fragment.bytes = fragment.len(),
            buffer.bytes = self.buffer.len(),
            "fragment buffered"
        );

        match self.demand {
            DemandState::Pending => self.advance(),
            DemandState::None => Signal::Idle,
        }
    }

    /// Upstream reached end of stream.
    ///
    /// If downstream is waiting, the remainder is flushed right away;
    /// otherwise it is flushed on the next [`ChunkBuffer::on_demand`].
    pub fn on_upstream_end(&mut self) -> Signal {
        if self.terminated {
            return Signal::Complete;
        }

        self.upstream = UpstreamState::Ended;
        self.outstanding = false;
        trace!(buffer.bytes = self.buffer.len(), "upstream ended");

        match self.demand {
            DemandState::Pending => self.advance(),
            DemandState::None => Signal::Idle,
        }
    }

    /// Upstream failed. The buffer is discarded and the stage terminates.
    pub fn on_upstream_failure(&mut self, err: std::io::Error) -> Signal {
        if self.terminated {
            return Signal::Complete;
        }

        warn!(
            error = %err,
            buffer.discarded = self.buffer.len(),
            chunk.offset = self.offset,
            "upstream failed, terminating stage"
        );

        self.upstream = UpstreamState::Failed;
        self.release();
        Signal::Failed(ChunkError::Upstream(err))
    }

    /// Downstream cancelled.
    ///
    /// The buffer is discarded without emitting a partial chunk and no
    /// further [`Signal::Pull`] is produced. Releasing the upstream source
    /// is the driver's job.
    pub fn on_cancel(&mut self) {
        if self.terminated {
            return;
        }

        debug!(
            buffer.discarded = self.buffer.len(),
            chunk.offset = self.offset,
            "downstream cancelled"
        );
        self.release();
    }

    /// Returns the target chunk size.
    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the upstream state.
    pub fn upstream_state(&self) -> UpstreamState {
        self.upstream
    }

    /// Returns the downstream demand state.
    pub fn demand_state(&self) -> DemandState {
        self.demand
    }

    /// Returns true while an upstream fragment request is outstanding.
    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    /// Returns true once the stage has completed, failed or been cancelled.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Returns the number of bytes emitted so far.
    ///
    /// This is the stream offset of the next chunk.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn advance(&mut self) -> Signal {
        if self.buffer.len() >= self.target_size {
            let data = self.buffer.split_to(self.target_size).freeze();
            return self.emit(data);
        }

        match self.upstream {
            UpstreamState::Open if self.outstanding => Signal::Idle,
            UpstreamState::Open => {
                self.outstanding = true;
                trace!(buffer.bytes = self.buffer.len(), "requesting fragment");
                Signal::Pull
            }
            UpstreamState::Ended if !self.buffer.is_empty() => {
                let data = self.buffer.split().freeze();
                let signal = self.emit(data);
                self.complete();
                signal
            }
            UpstreamState::Ended | UpstreamState::Failed => {
                self.complete();
                Signal::Complete
            }
        }
    }

    fn emit(&mut self, data: Bytes) -> Signal {
        let chunk = Chunk::new(data, self.offset);
        self.offset += chunk.len() as u64;
        self.demand = DemandState::None;
        trace!(
            chunk.offset = chunk.offset,
            chunk.bytes = chunk.len(),
            buffer.bytes = self.buffer.len(),
            "chunk emitted"
        );
        Signal::Emit(chunk)
    }

    fn complete(&mut self) {
        debug!(total.bytes = self.offset, "chunk buffer completed");
        self.release();
    }

    fn release(&mut self) {
        self.buffer = BytesMut::new();
        self.outstanding = false;
        self.demand = DemandState::None;
        self.terminated = true;
    }
}
