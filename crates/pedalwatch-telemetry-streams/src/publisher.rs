//! Sequence stamping and enqueueing of frames.

use std::sync::Arc;
use std::time::Duration;

use pedalwatch_calibration::CalibrationConfig;
use pedalwatch_detector::{DetectorEvents, PedalSample, RuntimeState};
use pedalwatch_device::RawAxes;
use tracing::{trace, warn};

use crate::frame::{ConnectionEvents, TelemetryFrame};
use crate::metrics::BridgeMetrics;
use crate::queue::TelemetryQueue;

/// Everything the sampling loop knows at publish time.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub device_id: u32,
    pub now_ms: u64,
    pub loop_duration: Duration,
    pub raw_axes: RawAxes,
    pub sample: &'a PedalSample,
    pub events: DetectorEvents,
    pub connection_events: ConnectionEvents,
    pub config: &'a CalibrationConfig,
    pub state: &'a RuntimeState,
}

/// Owns the frame sequence counter and pushes snapshots onto the queue.
///
/// Only the sampling loop publishes, so the counter is a plain field.
#[derive(Debug)]
pub struct FramePublisher {
    queue: Arc<TelemetryQueue<TelemetryFrame>>,
    metrics: Arc<BridgeMetrics>,
    sequence: u64,
}

impl FramePublisher {
    pub fn new(queue: Arc<TelemetryQueue<TelemetryFrame>>, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            queue,
            metrics,
            sequence: 0,
        }
    }

    /// Sequence number of the most recently published frame (0 before the first).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Snapshot `ctx` into a frame and enqueue it. Returns the frame's sequence number.
    pub fn publish(&mut self, ctx: FrameContext<'_>) -> u64 {
        self.sequence = self.sequence.saturating_add(1);
        let metrics = self.metrics.snapshot();

        let frame = TelemetryFrame {
            telemetry_sequence: self.sequence,
            device_id: ctx.device_id,
            monotonic_ms: ctx.now_ms,
            loop_duration_ms: ctx.loop_duration.as_secs_f64() * 1000.0,
            published_at_unix_ms: chrono::Utc::now().timestamp_millis(),
            last_http_serve_duration_ms: metrics.last_http_serve_duration_ms,
            last_speak_duration_ms: metrics.last_speak_duration_ms,
            frames_dropped: self.queue.dropped(),
            raw_axes: ctx.raw_axes,
            connection_events: ctx.connection_events,
            events: ctx.events,
            sample: *ctx.sample,
            state: ctx.state.clone(),
            config: ctx.config.clone(),
        };

        if self.queue.push(frame) {
            warn!(
                dropped = self.queue.dropped(),
                capacity = self.queue.capacity(),
                "telemetry queue full, oldest frame dropped"
            );
        }
        trace!(sequence = self.sequence, "frame published");
        self.sequence
    }
}
