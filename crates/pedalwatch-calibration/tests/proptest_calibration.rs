//! Property tests for the percentage math.

use pedalwatch_calibration::{
    AXIS_MAX_STANDARD, CalibrationConfig, CalibrationParams, PedalDeadzone, compute_logical_pct,
    normalize_pedal_axis, physical_pct, threshold_from_pct,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_logical_pct_is_monotonic(
        idle_max in 0u32..70_000,
        span in 1u32..70_000,
        a in any::<u32>(),
        b in any::<u32>(),
    ) {
        let full_min = idle_max.saturating_add(span);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            compute_logical_pct(lo, idle_max, full_min) <= compute_logical_pct(hi, idle_max, full_min)
        );
    }

    #[test]
    fn prop_logical_pct_endpoints(idle_max in 0u32..70_000, span in 1u32..70_000) {
        let full_min = idle_max + span;
        prop_assert_eq!(compute_logical_pct(idle_max, idle_max, full_min), 0);
        prop_assert_eq!(compute_logical_pct(full_min, idle_max, full_min), 100);
    }

    #[test]
    fn prop_logical_pct_bounded(value in any::<u32>(), idle_max in any::<u32>(), full_min in any::<u32>()) {
        prop_assert!(compute_logical_pct(value, idle_max, full_min) <= 100);
    }

    #[test]
    fn prop_degenerate_calibration_is_zero(
        value in any::<u32>(),
        full_min in 0u32..70_000,
        extra in 0u32..70_000,
    ) {
        let idle_max = full_min + extra;
        prop_assert_eq!(compute_logical_pct(value, idle_max, full_min), 0);
    }

    #[test]
    fn prop_normalized_value_stays_in_range(raw in 0u32..=AXIS_MAX_STANDARD, invert in any::<bool>()) {
        let value = normalize_pedal_axis(raw, AXIS_MAX_STANDARD, invert);
        prop_assert!(value <= AXIS_MAX_STANDARD);
        prop_assert!(physical_pct(value, AXIS_MAX_STANDARD) <= 100);
    }

    #[test]
    fn prop_thresholds_track_percentages(idle in 0u32..=100, full in 0u32..=100) {
        let params = CalibrationParams {
            gas: PedalDeadzone::new(idle, full),
            ..CalibrationParams::default()
        };
        let config = CalibrationConfig::new(&params, AXIS_MAX_STANDARD)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(config.gas_idle_max(), threshold_from_pct(AXIS_MAX_STANDARD, idle));
        prop_assert_eq!(config.gas_full_min(), threshold_from_pct(AXIS_MAX_STANDARD, full));
    }
}
