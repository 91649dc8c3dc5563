//! Startup configuration errors.
//!
//! Every variant is fatal: the monitor refuses to start rather than run with
//! parameters the detector cannot honour.

use crate::common::ErrorSeverity;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Value out of its allowed range
    #[error("{field} must be {min}-{max}, got {value}")]
    OutOfRange {
        /// Option name
        field: &'static str,
        /// The rejected value
        value: i64,
        /// Minimum allowed value
        min: i64,
        /// Maximum allowed value
        max: i64,
    },

    /// Value must be strictly positive
    #[error("{0} must be > 0")]
    MustBePositive(&'static str),

    /// Unknown axis selector
    #[error("invalid axis selector '{0}' (expected one of x, y, z, r, u, v)")]
    InvalidAxis(String),

    /// Input that should have been numeric was not
    #[error("invalid numeric value for {field}: '{input}'")]
    InvalidNumber {
        /// Option name
        field: &'static str,
        /// Raw input text
        input: String,
    },

    /// An option was given without the option it builds on
    #[error("{option} requires {requires}")]
    MissingDependency {
        /// The option that was supplied
        option: &'static str,
        /// The option it depends on
        requires: &'static str,
    },

    /// Auto-adjust floor would never be reachable
    #[error("adjust-deadzone-out-with-minimum ({minimum}) must be <= gas-deadzone-out ({deadzone_out})")]
    MinimumAboveDeadzoneOut {
        /// Requested auto-adjust floor
        minimum: u32,
        /// Configured gas deadzone-out
        deadzone_out: u32,
    },

    /// Joystick id outside the enumerable range
    #[error("invalid joystick id {0} (0-15)")]
    InvalidJoystickId(u32),

    /// Neither a joystick id nor a vendor/product identity was supplied
    #[error("no device selected: pass --joystick or --vendor-id/--product-id")]
    NoDeviceSelected,
}

impl ConfigError {
    /// Build an [`ConfigError::OutOfRange`] from any integer-like values.
    pub fn out_of_range(
        field: &'static str,
        value: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Self {
        ConfigError::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }
}
