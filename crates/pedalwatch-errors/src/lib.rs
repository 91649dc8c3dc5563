//! Centralized error types for PedalWatch
//!
//! The monitor distinguishes a small number of failure families:
//!
//! - [`config`]: invalid startup parameters. Always fatal at startup.
//! - [`device`]: hardware read failures and device lookup misses. Recoverable
//!   while a vendor/product identity is available to rescan against.
//! - [`transport`]: the telemetry listener could not be brought up. Fatal.
//!
//! A degenerate calibration (`fullMin <= idleMax`) is deliberately *not* an
//! error; the percentage math guards it and reports 0%.
//!
//! # Example
//!
//! ```
//! use pedalwatch_errors::prelude::*;
//!
//! fn check_margin(margin: u32) -> Result<u32> {
//!     if margin > 100 {
//!         return Err(ConfigError::out_of_range("margin", margin, 0, 100).into());
//!     }
//!     Ok(margin)
//! }
//!
//! assert!(check_margin(101).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod config;
pub mod device;
pub mod prelude;
pub mod transport;

pub use common::{ErrorCategory, ErrorSeverity, PedalWatchError};
pub use config::ConfigError;
pub use device::DeviceError;
pub use transport::TransportError;

/// A specialized `Result` type for PedalWatch operations.
pub type Result<T> = std::result::Result<T, PedalWatchError>;
