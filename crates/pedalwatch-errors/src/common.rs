//! Top-level error type and classification shared by every PedalWatch crate.

use core::fmt;

use crate::{ConfigError, DeviceError, TransportError};

/// Top-level error type wrapping every PedalWatch sub-error.
#[derive(Debug, thiserror::Error)]
pub enum PedalWatchError {
    /// Startup configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Device and hardware errors
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Telemetry transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl PedalWatchError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PedalWatchError::Config(_) => ErrorCategory::Config,
            PedalWatchError::Device(_) => ErrorCategory::Device,
            PedalWatchError::Transport(_) => ErrorCategory::Transport,
            PedalWatchError::Io(_) => ErrorCategory::IO,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PedalWatchError::Config(e) => e.severity(),
            PedalWatchError::Device(e) => e.severity(),
            PedalWatchError::Transport(e) => e.severity(),
            PedalWatchError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Check if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Process exit status when this error stops the daemon.
    ///
    /// A controller missing at startup gets its own status so wrappers can
    /// retry; every other device or I/O failure is a generic 1.
    pub fn exit_code(&self) -> u8 {
        if let PedalWatchError::Device(DeviceError::NotFound { .. }) = self {
            return 3;
        }
        match self.category() {
            ErrorCategory::Config => 2,
            ErrorCategory::Transport => 4,
            ErrorCategory::Device | ErrorCategory::IO => 1,
        }
    }
}

impl From<std::io::Error> for PedalWatchError {
    fn from(e: std::io::Error) -> Self {
        PedalWatchError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Configuration errors
    Config = 0,
    /// Device and hardware errors
    Device = 1,
    /// Telemetry transport errors
    Transport = 2,
    /// I/O errors
    IO = 3,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::Device => write!(f, "Device"),
            ErrorCategory::Transport => write!(f, "Transport"),
            ErrorCategory::IO => write!(f, "IO"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the process cannot continue
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Config.to_string(), "Config");
        assert_eq!(ErrorCategory::Device.to_string(), "Device");
        assert_eq!(ErrorCategory::Transport.to_string(), "Transport");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
    }

    #[test]
    fn test_read_failure_is_recoverable() {
        let err: PedalWatchError = DeviceError::ReadFailed { code: 167 }.into();
        assert_eq!(err.category(), ErrorCategory::Device);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_exit_codes_follow_category() {
        let config: PedalWatchError = ConfigError::NoDeviceSelected.into();
        assert_eq!(config.exit_code(), 2);

        let missing: PedalWatchError = DeviceError::NotFound {
            vendor_id: 0x0EB7,
            product_id: 0x1839,
        }
        .into();
        assert_eq!(missing.exit_code(), 3);

        let bind: PedalWatchError = TransportError::Serve(std::io::Error::other("boom")).into();
        assert_eq!(bind.exit_code(), 4);

        let backend: PedalWatchError = DeviceError::BackendUnavailable("hid".to_string()).into();
        assert_eq!(backend.exit_code(), 1);

        let io: PedalWatchError = std::io::Error::other("disk").into();
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn test_config_error_is_fatal() {
        let err: PedalWatchError = ConfigError::MustBePositive("sleep").into();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
    }
}
