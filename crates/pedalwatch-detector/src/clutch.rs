//! Clutch noise detection.
//!
//! A clutch axis that sits slightly off idle and barely moves while the gas
//! pedal is released points at electrical noise rather than a real press.

use pedalwatch_calibration::CalibrationConfig;

use crate::state::RuntimeState;

/// Feed one sample into the clutch noise counter.
///
/// Returns `true` when `clutch_repeat_required` consecutive qualifying samples
/// have been seen. The counter is cleared on the alert and on any
/// disqualifying sample.
pub fn evaluate_clutch(
    gas_value: u32,
    clutch_value: u32,
    config: &CalibrationConfig,
    state: &mut RuntimeState,
) -> bool {
    if gas_value <= config.gas_idle_max() && clutch_value > 0 {
        let diff = clutch_value.abs_diff(state.last_clutch_value);
        if diff <= config.axis_margin() {
            state.repeating_clutch_count = state.repeating_clutch_count.saturating_add(1);
        } else {
            state.repeating_clutch_count = 0;
        }
    } else {
        state.repeating_clutch_count = 0;
    }

    state.last_clutch_value = clutch_value;

    if state.repeating_clutch_count >= config.clutch_repeat_required() {
        state.repeating_clutch_count = 0;
        return true;
    }
    false
}
