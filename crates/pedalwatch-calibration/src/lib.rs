//! Pedal calibration
//!
//! Maps raw controller axis readings into a common travel space where
//! `0` is a pedal at rest and `axis_max` is a pedal fully pressed, then derives
//! physical and logical percentages from it.
//!
//! [`CalibrationConfig`] holds the tuning parameters and every threshold derived
//! from them. Derived thresholds are recomputed whenever a percentage input
//! changes, and the only runtime mutation is the gas deadzone-out auto-adjust.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod axis;
pub mod config;
pub mod wire;

pub use axis::*;
pub use config::*;

/// Axis maximum when the backend returns raw (10-bit) data.
pub const AXIS_MAX_RAW: u32 = 1023;

/// Axis maximum for standard 16-bit axis data.
pub const AXIS_MAX_STANDARD: u32 = 65535;

/// Capture flag bit requesting raw, uncalibrated axis data.
pub const RETURN_RAW_DATA: u32 = 256;

/// Default capture flags: every axis, calibrated.
pub const RETURN_ALL: u32 = 255;

/// Axis maximum implied by a set of capture flags.
pub fn axis_max_for_flags(flags: u32) -> u32 {
    if flags & RETURN_RAW_DATA != 0 {
        AXIS_MAX_RAW
    } else {
        AXIS_MAX_STANDARD
    }
}
