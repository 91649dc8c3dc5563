//! Device and hardware-related error types.

use crate::common::ErrorSeverity;

/// Device and hardware errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Non-zero result code from an axis poll
    #[error("axis read failed with code {code}")]
    ReadFailed {
        /// Backend result code (never 0)
        code: u32,
    },

    /// No enumerated device matched the requested identity
    #[error("no device matches vendor={vendor_id:#06x}, product={product_id:#06x}")]
    NotFound {
        /// USB vendor ID
        vendor_id: u16,
        /// USB product ID
        product_id: u16,
    },

    /// Backend could not be initialised
    #[error("device backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl DeviceError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DeviceError::ReadFailed { .. } => ErrorSeverity::Warning,
            DeviceError::NotFound { .. } => ErrorSeverity::Error,
            DeviceError::BackendUnavailable(_) => ErrorSeverity::Critical,
        }
    }
}
