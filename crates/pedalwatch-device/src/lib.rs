//! Joystick axis access for PedalWatch
//!
//! The sampling loop talks to hardware through the [`AxisSource`] trait:
//! `poll_axes` reads all six axes of a joystick id, `find_device` scans for a
//! vendor/product pair. [`mock::ScriptedAxisSource`] replays a script for tests
//! and hardware-less runs; the `hid` feature adds a hidapi-backed source.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod axes;
pub mod identity;
pub mod report;
pub mod source;

#[cfg(feature = "hid")]
pub mod hid;

pub use axes::*;
pub use identity::*;
pub use report::*;
pub use source::*;

#[cfg(feature = "hid")]
pub use hid::HidAxisSource;

/// Highest joystick id addressable without a vendor/product identity.
pub const MAX_JOYSTICK_ID: u32 = 15;
