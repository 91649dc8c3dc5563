//! Gas racing/idle state machine and drift detection.

use pedalwatch_calibration::{CalibrationConfig, physical_pct};
use tracing::{debug, info};

use crate::estimator::evaluate_estimator;
use crate::events::DetectorEvents;
use crate::state::{RuntimeState, elapsed_since};

/// Run one gas sample through the activity, drift and estimator logic.
pub fn evaluate_gas(
    gas_value: u32,
    config: &mut CalibrationConfig,
    state: &mut RuntimeState,
    now_ms: u64,
    events: &mut DetectorEvents,
) {
    let estimator = config.estimate_gas_deadzone_enabled();

    if gas_value > config.gas_idle_max() {
        if !state.is_racing {
            state.last_full_throttle_time = now_ms;
            state.peak_gas_in_window = 0;
            if estimator {
                state.restart_estimate_window(now_ms);
            }
            info!("Gas: activity resumed");
        }
        state.is_racing = true;
        state.last_gas_activity_time = now_ms;
    } else if state.is_racing
        && now_ms.saturating_sub(state.last_gas_activity_time) > config.gas_timeout_ms()
    {
        info!(idle_secs = config.gas_timeout_secs(), "Gas: auto-pause");
        state.is_racing = false;
        if estimator {
            state.restart_estimate_window(now_ms);
        }
    }

    if !state.is_racing {
        return;
    }

    state.peak_gas_in_window = state.peak_gas_in_window.max(gas_value);

    if gas_value >= config.gas_full_min() {
        state.last_full_throttle_time = now_ms;
        state.peak_gas_in_window = 0;
    } else if now_ms.saturating_sub(state.last_full_throttle_time) > config.gas_window_ms()
        && elapsed_since(now_ms, state.last_gas_alert_time) > config.gas_cooldown_ms()
    {
        let pct = physical_pct(state.peak_gas_in_window, config.axis_max());
        if pct > config.gas_min_usage_percent() {
            state.last_gas_alert_time = Some(now_ms);
            events.gas_alert = Some(pct);
            info!(percent = pct, "Gas alert: full throttle not reached");
        } else {
            debug!(percent = pct, "Gas window below minimum usage, no alert");
        }
    }

    if estimator {
        evaluate_estimator(gas_value, config, state, now_ms, events);
    }
}
