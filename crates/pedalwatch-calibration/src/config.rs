//! Calibration parameters and the derived thresholds the detector works with.

use pedalwatch_errors::ConfigError;
use serde::Serialize;

use crate::axis::threshold_from_pct;
use crate::wire::flag;

/// Idle/full deadzone percentages for one pedal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedalDeadzone {
    /// Percentage of travel treated as the idle band.
    pub idle_pct: u32,
    /// Percentage of travel treated as fully pressed.
    pub full_pct: u32,
}

impl PedalDeadzone {
    /// Creates a deadzone pair from idle/full percentages.
    pub const fn new(idle_pct: u32, full_pct: u32) -> Self {
        Self { idle_pct, full_pct }
    }
}

/// User-facing tuning inputs, before validation.
///
/// Durations are whole seconds and percentages are `0..=100`, matching the
/// command line. [`CalibrationConfig::new`] validates these and derives the
/// axis-unit thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationParams {
    /// Mirror inverted hardware into `0 = idle`.
    pub axis_normalization: bool,
    /// Run clutch noise detection.
    pub monitor_clutch: bool,
    /// Run gas drift detection.
    pub monitor_gas: bool,
    /// Gas pedal idle/full deadzones.
    pub gas: PedalDeadzone,
    /// Clutch pedal idle/full deadzones (logical percentage only).
    pub clutch: PedalDeadzone,
    /// Brake pedal idle/full deadzones (logical percentage only).
    pub brake: PedalDeadzone,
    /// Clutch stickiness tolerance, percent of travel.
    pub margin: u32,
    /// Consecutive sticky clutch samples that raise an alert.
    pub clutch_repeat_required: u32,
    /// Seconds of racing without full throttle before a drift check.
    pub gas_window_secs: u32,
    /// Minimum seconds between drift alerts; also the estimator window length.
    pub gas_cooldown_secs: u32,
    /// Seconds of idle gas before racing is considered paused.
    pub gas_timeout_secs: u32,
    /// Minimum peak usage (percent) for a window to count.
    pub gas_min_usage_percent: u32,
    /// Track the lowest reachable gas peak and announce it.
    pub estimate_gas_deadzone: bool,
    /// Floor for automatic gas deadzone-out adjustment, when enabled.
    pub auto_adjust_minimum: Option<u32>,
}

impl Default for CalibrationParams {
    fn default() -> Self {
        Self {
            axis_normalization: true,
            monitor_clutch: false,
            monitor_gas: false,
            gas: PedalDeadzone::new(5, 93),
            clutch: PedalDeadzone::new(0, 100),
            brake: PedalDeadzone::new(0, 100),
            margin: 5,
            clutch_repeat_required: 4,
            gas_window_secs: 30,
            gas_cooldown_secs: 60,
            gas_timeout_secs: 10,
            gas_min_usage_percent: 20,
            estimate_gas_deadzone: false,
            auto_adjust_minimum: None,
        }
    }
}

impl CalibrationParams {
    /// Check every input against the allowed ranges and option dependencies.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        percent("margin", self.margin)?;
        percent("gas-deadzone-in", self.gas.idle_pct)?;
        percent("gas-deadzone-out", self.gas.full_pct)?;
        percent("clutch-deadzone-in", self.clutch.idle_pct)?;
        percent("clutch-deadzone-out", self.clutch.full_pct)?;
        percent("brake-deadzone-in", self.brake.idle_pct)?;
        percent("brake-deadzone-out", self.brake.full_pct)?;
        percent("gas-min-usage", self.gas_min_usage_percent)?;

        positive("gas-window", self.gas_window_secs)?;
        positive("gas-timeout", self.gas_timeout_secs)?;
        positive("gas-cooldown", self.gas_cooldown_secs)?;
        positive("clutch-repeat", self.clutch_repeat_required)?;

        if self.estimate_gas_deadzone && !self.monitor_gas {
            return Err(ConfigError::MissingDependency {
                option: "--estimate-gas-deadzone-out",
                requires: "--monitor-gas",
            });
        }

        if let Some(minimum) = self.auto_adjust_minimum {
            percent("adjust-deadzone-out-with-minimum", minimum)?;
            if !self.monitor_gas {
                return Err(ConfigError::MissingDependency {
                    option: "--adjust-deadzone-out-with-minimum",
                    requires: "--monitor-gas",
                });
            }
            if !self.estimate_gas_deadzone {
                return Err(ConfigError::MissingDependency {
                    option: "--adjust-deadzone-out-with-minimum",
                    requires: "--estimate-gas-deadzone-out",
                });
            }
            if minimum > self.gas.full_pct {
                return Err(ConfigError::MinimumAboveDeadzoneOut {
                    minimum,
                    deadzone_out: self.gas.full_pct,
                });
            }
        }

        Ok(())
    }
}

fn percent(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value > 100 {
        return Err(ConfigError::out_of_range(field, value, 0u32, 100u32));
    }
    Ok(())
}

fn positive(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::MustBePositive(field));
    }
    Ok(())
}

/// Validated tuning parameters plus every threshold derived from them.
///
/// Fields are read-only from outside the crate. The single mutation path is
/// [`apply_auto_adjust`](Self::apply_auto_adjust), which lowers
/// `gas_deadzone_out` and recomputes `gas_full_min` in the same call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationConfig {
    axis_max: u32,
    #[serde(serialize_with = "flag")]
    axis_normalization_enabled: bool,
    #[serde(serialize_with = "flag")]
    monitor_clutch: bool,
    #[serde(serialize_with = "flag")]
    monitor_gas: bool,

    gas_deadzone_in: u32,
    gas_deadzone_out: u32,
    clutch_deadzone_in: u32,
    clutch_deadzone_out: u32,
    brake_deadzone_in: u32,
    brake_deadzone_out: u32,
    margin: u32,
    clutch_repeat_required: u32,
    gas_window: u32,
    gas_cooldown: u32,
    gas_timeout: u32,
    gas_min_usage_percent: u32,
    #[serde(serialize_with = "flag")]
    estimate_gas_deadzone_enabled: bool,
    #[serde(serialize_with = "flag")]
    auto_gas_deadzone_enabled: bool,
    auto_gas_deadzone_minimum: u32,

    // Derived
    gas_idle_max: u32,
    gas_full_min: u32,
    clutch_idle_max: u32,
    clutch_full_min: u32,
    brake_idle_max: u32,
    brake_full_min: u32,
    axis_margin: u32,
    gas_window_ms: u64,
    gas_cooldown_ms: u64,
    gas_timeout_ms: u64,
}

impl CalibrationConfig {
    /// Validate `params` and derive thresholds for an axis of `axis_max` units.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `params` fails validation.
    pub fn new(params: &CalibrationParams, axis_max: u32) -> Result<Self, ConfigError> {
        params.validate()?;

        let mut config = Self {
            axis_max,
            axis_normalization_enabled: params.axis_normalization,
            monitor_clutch: params.monitor_clutch,
            monitor_gas: params.monitor_gas,
            gas_deadzone_in: params.gas.idle_pct,
            gas_deadzone_out: params.gas.full_pct,
            clutch_deadzone_in: params.clutch.idle_pct,
            clutch_deadzone_out: params.clutch.full_pct,
            brake_deadzone_in: params.brake.idle_pct,
            brake_deadzone_out: params.brake.full_pct,
            margin: params.margin,
            clutch_repeat_required: params.clutch_repeat_required,
            gas_window: params.gas_window_secs,
            gas_cooldown: params.gas_cooldown_secs,
            gas_timeout: params.gas_timeout_secs,
            gas_min_usage_percent: params.gas_min_usage_percent,
            estimate_gas_deadzone_enabled: params.estimate_gas_deadzone,
            auto_gas_deadzone_enabled: params.auto_adjust_minimum.is_some(),
            auto_gas_deadzone_minimum: params.auto_adjust_minimum.unwrap_or(0),
            gas_idle_max: 0,
            gas_full_min: 0,
            clutch_idle_max: 0,
            clutch_full_min: 0,
            brake_idle_max: 0,
            brake_full_min: 0,
            axis_margin: 0,
            gas_window_ms: 0,
            gas_cooldown_ms: 0,
            gas_timeout_ms: 0,
        };
        config.recompute();
        Ok(config)
    }

    /// Re-derive every axis-unit threshold from the percentage inputs.
    fn recompute(&mut self) {
        let axis_max = self.axis_max;
        self.gas_idle_max = threshold_from_pct(axis_max, self.gas_deadzone_in);
        self.gas_full_min = threshold_from_pct(axis_max, self.gas_deadzone_out);
        self.clutch_idle_max = threshold_from_pct(axis_max, self.clutch_deadzone_in);
        self.clutch_full_min = threshold_from_pct(axis_max, self.clutch_deadzone_out);
        self.brake_idle_max = threshold_from_pct(axis_max, self.brake_deadzone_in);
        self.brake_full_min = threshold_from_pct(axis_max, self.brake_deadzone_out);
        self.axis_margin = threshold_from_pct(axis_max, self.margin);
        self.gas_window_ms = secs_to_ms(self.gas_window);
        self.gas_cooldown_ms = secs_to_ms(self.gas_cooldown);
        self.gas_timeout_ms = secs_to_ms(self.gas_timeout);
    }

    /// Lower `gas_deadzone_out` to `estimate_pct` if auto-adjust allows it.
    ///
    /// Applies only when auto-adjust is enabled, the estimate is strictly below
    /// the current deadzone-out and not below the configured floor. Returns
    /// whether the threshold moved.
    pub fn apply_auto_adjust(&mut self, estimate_pct: u32) -> bool {
        if !self.auto_gas_deadzone_enabled
            || estimate_pct >= self.gas_deadzone_out
            || estimate_pct < self.auto_gas_deadzone_minimum
        {
            return false;
        }
        self.gas_deadzone_out = estimate_pct;
        self.recompute();
        true
    }

    /// Axis range maximum (1023 raw, 65535 standard).
    pub fn axis_max(&self) -> u32 {
        self.axis_max
    }

    /// Whether raw readings are mirrored before use.
    pub fn axis_normalization_enabled(&self) -> bool {
        self.axis_normalization_enabled
    }

    /// Whether clutch noise detection runs.
    pub fn monitor_clutch(&self) -> bool {
        self.monitor_clutch
    }

    /// Whether gas drift detection runs.
    pub fn monitor_gas(&self) -> bool {
        self.monitor_gas
    }

    /// Gas idle band, percent.
    pub fn gas_deadzone_in(&self) -> u32 {
        self.gas_deadzone_in
    }

    /// Gas full-throttle threshold, percent.
    pub fn gas_deadzone_out(&self) -> u32 {
        self.gas_deadzone_out
    }

    /// Clutch stickiness tolerance, percent.
    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn clutch_repeat_required(&self) -> u32 {
        self.clutch_repeat_required
    }

    pub fn gas_min_usage_percent(&self) -> u32 {
        self.gas_min_usage_percent
    }

    pub fn gas_timeout_secs(&self) -> u32 {
        self.gas_timeout
    }

    pub fn estimate_gas_deadzone_enabled(&self) -> bool {
        self.estimate_gas_deadzone_enabled
    }

    pub fn auto_gas_deadzone_enabled(&self) -> bool {
        self.auto_gas_deadzone_enabled
    }

    pub fn auto_gas_deadzone_minimum(&self) -> u32 {
        self.auto_gas_deadzone_minimum
    }

    /// Highest normalized gas value still considered idle.
    pub fn gas_idle_max(&self) -> u32 {
        self.gas_idle_max
    }

    /// Lowest normalized gas value considered full throttle.
    pub fn gas_full_min(&self) -> u32 {
        self.gas_full_min
    }

    pub fn clutch_idle_max(&self) -> u32 {
        self.clutch_idle_max
    }

    pub fn clutch_full_min(&self) -> u32 {
        self.clutch_full_min
    }

    pub fn brake_idle_max(&self) -> u32 {
        self.brake_idle_max
    }

    pub fn brake_full_min(&self) -> u32 {
        self.brake_full_min
    }

    /// Clutch stickiness tolerance in axis units.
    pub fn axis_margin(&self) -> u32 {
        self.axis_margin
    }

    pub fn gas_window_ms(&self) -> u64 {
        self.gas_window_ms
    }

    pub fn gas_cooldown_ms(&self) -> u64 {
        self.gas_cooldown_ms
    }

    pub fn gas_timeout_ms(&self) -> u64 {
        self.gas_timeout_ms
    }
}

fn secs_to_ms(secs: u32) -> u64 {
    u64::from(secs).saturating_mul(1000)
}
