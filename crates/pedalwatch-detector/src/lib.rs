//! Pedal anomaly detection
//!
//! Given one [`PedalSample`], the current [`CalibrationConfig`] and the
//! device's [`RuntimeState`], [`evaluate`] runs:
//!
//! - clutch noise detection (small clutch oscillation while the gas pedal idles)
//! - the gas racing/idle state machine and drift alert (full throttle not
//!   reached within `gas_window`)
//! - the gas deadzone-out estimator and optional auto-adjust
//!
//! Every input, including time, is passed in explicitly. The only side
//! effects are on `state` and, on the auto-adjust path, on `config`.
//!
//! # Example
//!
//! ```
//! use pedalwatch_calibration::{AXIS_MAX_STANDARD, CalibrationConfig, CalibrationParams};
//! use pedalwatch_detector::{PedalSample, RawPedals, RuntimeState, evaluate};
//!
//! let params = CalibrationParams { monitor_clutch: true, ..Default::default() };
//! let mut config = CalibrationConfig::new(&params, AXIS_MAX_STANDARD).unwrap();
//! let mut state = RuntimeState::new(0);
//!
//! let raw = RawPedals { gas: AXIS_MAX_STANDARD, clutch: AXIS_MAX_STANDARD - 10, brake: 0 };
//! let sample = PedalSample::from_raw(raw, &config);
//!
//! let alerts: Vec<bool> = (0..4)
//!     .map(|i| evaluate(&sample, &mut config, &mut state, i * 1000).clutch_alert)
//!     .collect();
//! assert_eq!(alerts, [false, false, false, true]);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod clutch;
pub mod estimator;
pub mod events;
pub mod gas;
pub mod sample;
pub mod state;

pub use clutch::evaluate_clutch;
pub use estimator::evaluate_estimator;
pub use events::DetectorEvents;
pub use gas::evaluate_gas;
pub use sample::{PedalReading, PedalSample, RawPedals};
pub use state::{ConnectionLatch, RuntimeState, elapsed_since};

use pedalwatch_calibration::CalibrationConfig;
use tracing::trace;

/// Run every enabled detector on one sample.
pub fn evaluate(
    sample: &PedalSample,
    config: &mut CalibrationConfig,
    state: &mut RuntimeState,
    now_ms: u64,
) -> DetectorEvents {
    let mut events = DetectorEvents::default();

    if config.monitor_clutch() {
        events.clutch_alert =
            evaluate_clutch(sample.gas.value, sample.clutch.value, config, state);
    }

    if config.monitor_gas() {
        evaluate_gas(sample.gas.value, config, state, now_ms, &mut events);
    }

    if events.any() {
        trace!(?events, "detector events");
    }
    events
}
