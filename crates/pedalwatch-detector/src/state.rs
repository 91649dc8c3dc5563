//! Per-device runtime state owned by the sampling loop.

use pedalwatch_calibration::wire::flag;
use serde::Serialize;

/// Connected/disconnected latch.
///
/// Repeated read failures while already latched do not raise a second
/// transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionLatch {
    #[serde(rename = "controllerDisconnectedState", serialize_with = "flag")]
    pub disconnected: bool,
    pub last_disconnect_time: Option<u64>,
    pub last_reconnect_time: Option<u64>,
}

impl ConnectionLatch {
    /// Latch a disconnect. Returns `true` only on the connected-to-disconnected edge.
    pub fn mark_disconnected(&mut self, now_ms: u64) -> bool {
        if self.disconnected {
            return false;
        }
        self.disconnected = true;
        self.last_disconnect_time = Some(now_ms);
        true
    }

    /// Release the latch. Returns `true` only on the disconnected-to-connected edge.
    pub fn mark_reconnected(&mut self, now_ms: u64) -> bool {
        if !self.disconnected {
            return false;
        }
        self.disconnected = false;
        self.last_reconnect_time = Some(now_ms);
        true
    }
}

/// Counters and timers for one monitored device.
///
/// Times are monotonic milliseconds. `None` means "never", and elapsed time
/// measured against it is treated as unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeState {
    #[serde(serialize_with = "flag")]
    pub is_racing: bool,
    pub peak_gas_in_window: u32,
    pub last_full_throttle_time: u64,
    pub last_gas_activity_time: u64,
    pub last_gas_alert_time: Option<u64>,

    pub last_clutch_value: u32,
    pub repeating_clutch_count: u32,

    pub best_estimate_percent: u32,
    pub last_printed_estimate: u32,
    pub estimate_window_peak_percent: u32,
    pub estimate_window_start_time: u64,
    pub last_estimate_print_time: Option<u64>,

    #[serde(flatten)]
    pub connection: ConnectionLatch,
}

impl RuntimeState {
    /// Fresh state as of `now_ms`: idle, every timer anchored at `now_ms`,
    /// no alert or announcement yet, best estimate at 100%.
    pub fn new(now_ms: u64) -> Self {
        Self {
            is_racing: false,
            peak_gas_in_window: 0,
            last_full_throttle_time: now_ms,
            last_gas_activity_time: now_ms,
            last_gas_alert_time: None,
            last_clutch_value: 0,
            repeating_clutch_count: 0,
            best_estimate_percent: 100,
            last_printed_estimate: 100,
            estimate_window_peak_percent: 0,
            estimate_window_start_time: now_ms,
            last_estimate_print_time: None,
            connection: ConnectionLatch::default(),
        }
    }

    /// Restore initial values, keeping the connection latch.
    pub fn reset(&mut self, now_ms: u64) {
        let connection = self.connection;
        *self = Self {
            connection,
            ..Self::new(now_ms)
        };
    }

    /// Restart the estimator window at `now_ms`.
    pub fn restart_estimate_window(&mut self, now_ms: u64) {
        self.estimate_window_start_time = now_ms;
        self.estimate_window_peak_percent = 0;
    }
}

/// Milliseconds between `since` and `now_ms`; `u64::MAX` when `since` was never set.
#[inline]
pub fn elapsed_since(now_ms: u64, since: Option<u64>) -> u64 {
    since.map_or(u64::MAX, |t| now_ms.saturating_sub(t))
}
