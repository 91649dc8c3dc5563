//! Immutable telemetry snapshot.

use pedalwatch_calibration::CalibrationConfig;
use pedalwatch_calibration::wire::flag;
use pedalwatch_detector::{DetectorEvents, PedalSample, RuntimeState};
use pedalwatch_device::RawAxes;
use serde::Serialize;

/// Connection transitions carried by a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvents {
    #[serde(serialize_with = "flag")]
    pub controller_disconnected: bool,
    #[serde(serialize_with = "flag")]
    pub controller_reconnected: bool,
}

impl ConnectionEvents {
    pub const NONE: Self = Self {
        controller_disconnected: false,
        controller_reconnected: false,
    };
    pub const DISCONNECTED: Self = Self {
        controller_disconnected: true,
        controller_reconnected: false,
    };
    pub const RECONNECTED: Self = Self {
        controller_disconnected: false,
        controller_reconnected: true,
    };
}

/// One published frame.
///
/// Serializes as a single flat JSON object: the frame's own fields, then
/// every calibration, runtime, sample and event field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryFrame {
    pub telemetry_sequence: u64,
    pub device_id: u32,
    pub monotonic_ms: u64,
    pub loop_duration_ms: f64,
    pub published_at_unix_ms: i64,
    pub last_http_serve_duration_ms: f64,
    pub last_speak_duration_ms: f64,
    pub frames_dropped: u64,
    pub raw_axes: RawAxes,

    #[serde(flatten)]
    pub connection_events: ConnectionEvents,
    #[serde(flatten)]
    pub events: DetectorEvents,
    #[serde(flatten)]
    pub sample: PedalSample,
    #[serde(flatten)]
    pub state: RuntimeState,
    #[serde(flatten)]
    pub config: CalibrationConfig,
}
