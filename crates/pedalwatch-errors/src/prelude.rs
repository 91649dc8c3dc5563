//! Prelude module for convenient error handling imports.

pub use crate::{
    Result,
    common::{ErrorCategory, ErrorSeverity, PedalWatchError},
    config::ConfigError,
    device::DeviceError,
    transport::TransportError,
};
