//! Response body for one poll of the bridge.

use serde::Serialize;

use crate::frame::TelemetryFrame;
use crate::metrics::BridgeMetrics;
use crate::queue::TelemetryQueue;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeInfo {
    pub batch_id: u64,
    pub served_at_unix_ms: i64,
    pub pending_frame_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeEnvelope {
    pub schema_version: u32,
    pub bridge_info: BridgeInfo,
    pub frames: Vec<TelemetryFrame>,
}

impl BridgeEnvelope {
    /// Drain every queued frame into a new batch.
    ///
    /// The batch id is taken while the queue is still locked, so batch ids
    /// follow drain order. An empty queue yields an envelope with no frames.
    pub fn collect(queue: &TelemetryQueue<TelemetryFrame>, metrics: &BridgeMetrics) -> Self {
        let (batch_id, frames) = queue.drain_all_with(|| metrics.next_batch_id());
        Self {
            schema_version: SCHEMA_VERSION,
            bridge_info: BridgeInfo {
                batch_id,
                served_at_unix_ms: chrono::Utc::now().timestamp_millis(),
                pending_frame_count: frames.len(),
            },
            frames,
        }
    }
}
