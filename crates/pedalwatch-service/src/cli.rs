//! Command line and validated daemon configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use pedalwatch_calibration::{CalibrationParams, PedalDeadzone, RETURN_ALL, axis_max_for_flags};
use pedalwatch_device::{
    AxisSelector, DeviceIdentity, MAX_JOYSTICK_ID, PedalAxisMap, parse_hex_id,
};
use pedalwatch_errors::ConfigError;
use pedalwatch_telemetry_streams::DEFAULT_QUEUE_CAPACITY;

/// Where axis readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Built-in source reporting pedals at rest; useful without hardware
    Scripted,
    /// hidapi joystick interfaces (requires the `hid` feature)
    Hid,
}

fn parse_vendor_id(s: &str) -> Result<u16, ConfigError> {
    parse_hex_id("vendor-id", s)
}

fn parse_product_id(s: &str) -> Result<u16, ConfigError> {
    parse_hex_id("product-id", s)
}

#[derive(Debug, Clone, Parser)]
#[command(name = "pedalwatchd")]
#[command(about = "Racing pedal monitor: clutch noise, gas drift and a live telemetry bridge")]
#[command(version)]
pub struct Args {
    /// Joystick id to poll (0-15)
    #[arg(short = 'j', long)]
    pub joystick: Option<u32>,

    /// USB vendor id in hex (e.g. 0EB7), used for auto-detection and reconnect
    #[arg(long, value_parser = parse_vendor_id)]
    pub vendor_id: Option<u16>,

    /// USB product id in hex (e.g. 1839)
    #[arg(long, value_parser = parse_product_id)]
    pub product_id: Option<u16>,

    /// Capture flags; bit 256 selects raw 10-bit axis data
    #[arg(short = 'f', long, default_value_t = RETURN_ALL)]
    pub flags: u32,

    /// Number of polls before exiting (0 = run until interrupted)
    #[arg(short = 'i', long, default_value_t = 0)]
    pub iterations: u64,

    /// Milliseconds between polls
    #[arg(short = 's', long, default_value_t = 1000)]
    pub sleep: u64,

    /// Enable clutch noise detection
    #[arg(long)]
    pub monitor_clutch: bool,

    /// Enable gas drift detection
    #[arg(long)]
    pub monitor_gas: bool,

    /// Track and announce the lowest reachable gas peak (requires --monitor-gas)
    #[arg(long)]
    pub estimate_gas_deadzone_out: bool,

    /// Lower gas-deadzone-out to new estimates, never below this value
    #[arg(long, value_name = "MIN")]
    pub adjust_deadzone_out_with_minimum: Option<u32>,

    /// Use raw axis values as-is instead of mirroring inverted hardware
    #[arg(long)]
    pub no_axis_normalization: bool,

    /// Include raw and normalized values in per-sample debug output
    #[arg(long)]
    pub debug_raw: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, default_value_t = 5)]
    pub gas_deadzone_in: u32,

    #[arg(long, default_value_t = 93)]
    pub gas_deadzone_out: u32,

    /// Seconds without full throttle before a drift alert
    #[arg(long, default_value_t = 30)]
    pub gas_window: u32,

    /// Minimum seconds between drift alerts
    #[arg(long, default_value_t = 60)]
    pub gas_cooldown: u32,

    /// Idle seconds before racing is considered paused
    #[arg(long, default_value_t = 10)]
    pub gas_timeout: u32,

    /// Minimum peak usage (percent) for a drift alert
    #[arg(long, default_value_t = 20)]
    pub gas_min_usage: u32,

    /// Clutch stickiness tolerance, percent of travel
    #[arg(short = 'm', long, default_value_t = 5)]
    pub margin: u32,

    /// Consecutive sticky clutch samples before an alert
    #[arg(long, default_value_t = 4)]
    pub clutch_repeat: u32,

    #[arg(long, default_value_t = 0)]
    pub clutch_deadzone_in: u32,

    #[arg(long, default_value_t = 100)]
    pub clutch_deadzone_out: u32,

    #[arg(long, default_value_t = 0)]
    pub brake_deadzone_in: u32,

    #[arg(long, default_value_t = 100)]
    pub brake_deadzone_out: u32,

    #[arg(long, default_value = "y")]
    pub gas_axis: AxisSelector,

    #[arg(long, default_value = "r")]
    pub clutch_axis: AxisSelector,

    #[arg(long, default_value = "z")]
    pub brake_axis: AxisSelector,

    /// Address for the telemetry bridge
    #[arg(long, default_value = "127.0.0.1:8181")]
    pub http_bind: SocketAddr,

    /// Frames kept while no client polls (0 = unbounded)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Seconds between device scans while disconnected
    #[arg(long, default_value_t = 60)]
    pub rescan_interval: u64,

    /// Program that speaks alerts; the text is passed as its last argument
    #[arg(long, value_name = "PROGRAM")]
    pub speech_command: Option<String>,

    #[arg(long, value_enum, default_value_t = Backend::Scripted)]
    pub backend: Backend,
}

impl Args {
    pub fn calibration_params(&self) -> CalibrationParams {
        CalibrationParams {
            axis_normalization: !self.no_axis_normalization,
            monitor_clutch: self.monitor_clutch,
            monitor_gas: self.monitor_gas,
            gas: PedalDeadzone::new(self.gas_deadzone_in, self.gas_deadzone_out),
            clutch: PedalDeadzone::new(self.clutch_deadzone_in, self.clutch_deadzone_out),
            brake: PedalDeadzone::new(self.brake_deadzone_in, self.brake_deadzone_out),
            margin: self.margin,
            clutch_repeat_required: self.clutch_repeat,
            gas_window_secs: self.gas_window,
            gas_cooldown_secs: self.gas_cooldown,
            gas_timeout_secs: self.gas_timeout,
            gas_min_usage_percent: self.gas_min_usage,
            estimate_gas_deadzone: self.estimate_gas_deadzone_out,
            auto_adjust_minimum: self.adjust_deadzone_out_with_minimum,
        }
    }
}

/// Fully validated daemon settings.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub params: CalibrationParams,
    pub axis_max: u32,
    pub flags: u32,
    pub joystick: Option<u32>,
    pub identity: Option<DeviceIdentity>,
    pub axis_map: PedalAxisMap,
    pub iterations: u64,
    pub sleep: Duration,
    pub rescan_interval: Duration,
    pub debug_raw: bool,
    pub http_bind: SocketAddr,
    pub queue_capacity: usize,
    pub speech_command: Option<String>,
    pub backend: Backend,
}

impl DaemonConfig {
    /// Check cross-option rules and collect the settings the daemon runs with.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let params = args.calibration_params();
        params.validate()?;

        if args.sleep == 0 {
            return Err(ConfigError::MustBePositive("sleep"));
        }
        if args.rescan_interval == 0 {
            return Err(ConfigError::MustBePositive("rescan-interval"));
        }

        if args.vendor_id.is_some() != args.product_id.is_some() {
            let (option, requires) = if args.vendor_id.is_some() {
                ("--vendor-id", "--product-id")
            } else {
                ("--product-id", "--vendor-id")
            };
            return Err(ConfigError::MissingDependency { option, requires });
        }
        let identity = DeviceIdentity::from_parts(args.vendor_id, args.product_id);

        match args.joystick {
            Some(id) if id > MAX_JOYSTICK_ID && identity.is_none() => {
                return Err(ConfigError::InvalidJoystickId(id));
            }
            None if identity.is_none() => return Err(ConfigError::NoDeviceSelected),
            _ => {}
        }

        Ok(Self {
            params,
            axis_max: axis_max_for_flags(args.flags),
            flags: args.flags,
            joystick: args.joystick,
            identity,
            axis_map: PedalAxisMap {
                gas: args.gas_axis,
                clutch: args.clutch_axis,
                brake: args.brake_axis,
            },
            iterations: args.iterations,
            sleep: Duration::from_millis(args.sleep),
            rescan_interval: Duration::from_secs(args.rescan_interval),
            debug_raw: args.debug_raw,
            http_bind: args.http_bind,
            queue_capacity: args.queue_capacity,
            speech_command: args.speech_command.clone(),
            backend: args.backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalwatch_calibration::{AXIS_MAX_RAW, AXIS_MAX_STANDARD};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("pedalwatchd").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() -> TestResult {
        let args = parse(&["-j", "0"])?;
        let config = DaemonConfig::from_args(&args)?;

        assert_eq!(config.axis_max, AXIS_MAX_STANDARD);
        assert_eq!(config.iterations, 0);
        assert_eq!(config.sleep, Duration::from_millis(1000));
        assert_eq!(config.rescan_interval, Duration::from_secs(60));
        assert_eq!(config.queue_capacity, 10_000);
        assert_eq!(config.http_bind.to_string(), "127.0.0.1:8181");
        assert_eq!(config.axis_map, PedalAxisMap::default());
        assert_eq!(config.backend, Backend::Scripted);
        assert_eq!(config.params, CalibrationParams::default());
        Ok(())
    }

    #[test]
    fn test_raw_flag_selects_ten_bit_axis() -> TestResult {
        let config = DaemonConfig::from_args(&parse(&["-j", "1", "--flags", "266"])?)?;
        assert_eq!(config.axis_max, AXIS_MAX_RAW);
        Ok(())
    }

    #[test]
    fn test_hex_identity_and_axis_mapping() -> TestResult {
        let args = parse(&[
            "--vendor-id",
            "0EB7",
            "--product-id",
            "0x1839",
            "--gas-axis",
            "x",
            "--clutch-axis",
            "U",
        ])?;
        let config = DaemonConfig::from_args(&args)?;
        assert_eq!(config.identity, Some(DeviceIdentity::new(0x0eb7, 0x1839)));
        assert_eq!(config.joystick, None);
        assert_eq!(config.axis_map.gas, AxisSelector::X);
        assert_eq!(config.axis_map.clutch, AxisSelector::U);
        Ok(())
    }

    #[test]
    fn test_invalid_axis_is_rejected_by_parser() {
        assert!(parse(&["-j", "0", "--gas-axis", "w"]).is_err());
        assert!(parse(&["-j", "0", "--vendor-id", "xyz"]).is_err());
    }

    #[test]
    fn test_no_device_selected() -> TestResult {
        let err = DaemonConfig::from_args(&parse(&[])?).err();
        assert_eq!(err, Some(ConfigError::NoDeviceSelected));
        Ok(())
    }

    #[test]
    fn test_high_joystick_id_needs_identity() -> TestResult {
        let err = DaemonConfig::from_args(&parse(&["-j", "17"])?).err();
        assert_eq!(err, Some(ConfigError::InvalidJoystickId(17)));

        let args = parse(&["-j", "17", "--vendor-id", "eb7", "--product-id", "1839"])?;
        assert!(DaemonConfig::from_args(&args).is_ok());
        Ok(())
    }

    #[test]
    fn test_vendor_without_product() -> TestResult {
        let err = DaemonConfig::from_args(&parse(&["--vendor-id", "eb7"])?).err();
        assert!(matches!(
            err,
            Some(ConfigError::MissingDependency {
                option: "--vendor-id",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_zero_sleep_rejected() -> TestResult {
        let err = DaemonConfig::from_args(&parse(&["-j", "0", "--sleep", "0"])?).err();
        assert_eq!(err, Some(ConfigError::MustBePositive("sleep")));
        Ok(())
    }

    #[test]
    fn test_calibration_rules_apply() -> TestResult {
        let err = DaemonConfig::from_args(&parse(&["-j", "0", "--margin", "150"])?).err();
        assert_eq!(
            err,
            Some(ConfigError::out_of_range("margin", 150u32, 0u32, 100u32))
        );

        let args = parse(&[
            "-j",
            "0",
            "--monitor-gas",
            "--adjust-deadzone-out-with-minimum",
            "80",
        ])?;
        assert!(matches!(
            DaemonConfig::from_args(&args),
            Err(ConfigError::MissingDependency { .. })
        ));
        Ok(())
    }
}
