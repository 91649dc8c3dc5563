//! Telemetry pipeline between the sampling loop and bridge clients
//!
//! - [`FramePublisher`] stamps a sequence number and timing metrics onto a
//!   snapshot of the current state and pushes it onto the queue
//! - [`TelemetryQueue`] is the only shared mutable structure; readers drain it
//!   wholesale
//! - [`BridgeEnvelope::collect`] turns one drain into a numbered batch
//! - [`BridgeMetrics`] carries the few cross-thread counters

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod envelope;
pub mod frame;
pub mod metrics;
pub mod publisher;
pub mod queue;

pub use envelope::{BridgeEnvelope, BridgeInfo, SCHEMA_VERSION};
pub use frame::{ConnectionEvents, TelemetryFrame};
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use publisher::{FrameContext, FramePublisher};
pub use queue::TelemetryQueue;

/// Frames kept while no client is polling.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
