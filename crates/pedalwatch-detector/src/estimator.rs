//! Gas deadzone-out estimator.
//!
//! Each window lasts `gas_cooldown` and tracks the deepest gas press seen in
//! it. A window that reached at least `gas_min_usage_percent` but stayed below
//! the best estimate so far lowers the estimate. With auto-adjust enabled the
//! new estimate also lowers `gas_deadzone_out`, never below the configured
//! floor.

use pedalwatch_calibration::{CalibrationConfig, physical_pct};
use tracing::info;

use crate::events::DetectorEvents;
use crate::state::{RuntimeState, elapsed_since};

/// Update the estimator with one racing sample.
///
/// Only called while racing and with the estimator enabled.
pub fn evaluate_estimator(
    gas_value: u32,
    config: &mut CalibrationConfig,
    state: &mut RuntimeState,
    now_ms: u64,
    events: &mut DetectorEvents,
) {
    if gas_value > config.gas_idle_max() {
        let current = physical_pct(gas_value, config.axis_max());
        state.estimate_window_peak_percent = state.estimate_window_peak_percent.max(current);
    }

    let window_elapsed = now_ms.saturating_sub(state.estimate_window_start_time);
    if window_elapsed < config.gas_cooldown_ms() {
        return;
    }

    let candidate = state.estimate_window_peak_percent;
    if candidate >= config.gas_min_usage_percent() && candidate < state.best_estimate_percent {
        state.best_estimate_percent = candidate;

        let since_print = elapsed_since(now_ms, state.last_estimate_print_time);
        if candidate < state.last_printed_estimate && since_print >= config.gas_cooldown_ms() {
            state.last_printed_estimate = candidate;
            state.last_estimate_print_time = Some(now_ms);
            events.estimate_decreased = Some(candidate);
            info!(estimate = candidate, "[Estimate] suggested gas-deadzone-out");
        }

        if config.apply_auto_adjust(candidate) {
            events.auto_adjust = Some(candidate);
            info!(
                gas_deadzone_out = candidate,
                minimum = config.auto_gas_deadzone_minimum(),
                gas_full_min = config.gas_full_min(),
                "[AutoAdjust] gas-deadzone-out updated"
            );
        }
    }

    state.restart_estimate_window(now_ms);
}
