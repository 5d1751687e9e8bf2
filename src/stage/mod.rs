//! The rechunking stage.
//!
//! - [`ChunkBuffer`] - Demand-driven state machine turning fragments into fixed-size chunks
//! - [`Signal`] - What the driver must do after each operation
//! - [`UpstreamState`], [`DemandState`] - Observable stage state
//!
//! The stage performs no I/O. A driver feeds it events from downstream
//! (`on_demand`, `on_cancel`) and upstream (`on_fragment`,
//! `on_upstream_end`, `on_upstream_failure`) and acts on the returned
//! [`Signal`]. [`ChunkIter`](crate::ChunkIter) is the synchronous driver;
//! `ChunkStream` (feature `async-io`) is the asynchronous one.

mod buffer;

pub use buffer::{ChunkBuffer, DemandState, Signal, UpstreamState};
