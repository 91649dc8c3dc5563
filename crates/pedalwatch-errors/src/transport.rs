//! Telemetry transport errors.

use crate::common::ErrorSeverity;

/// Errors raised while bringing up or running the telemetry listener.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The local address could not be bound (usually already in use)
    #[error("failed to bind telemetry listener on {addr}: {source}")]
    Bind {
        /// Requested bind address
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// The server loop terminated with an error
    #[error("telemetry server failed: {0}")]
    Serve(#[source] std::io::Error),
}

impl TransportError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }
}
