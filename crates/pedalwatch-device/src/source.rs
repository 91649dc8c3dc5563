//! The axis polling collaborator.

use pedalwatch_errors::DeviceError;

use crate::axes::RawAxes;

/// Result code for a successful poll.
pub const POLL_OK: u32 = 0;

/// Result code reported when the device has been unplugged.
pub const POLL_UNPLUGGED: u32 = 167;

/// Result code reported for an unknown or unusable device id.
pub const POLL_BAD_DEVICE: u32 = 165;

/// Source of joystick axis readings.
///
/// Polls may block briefly on hardware; failures come back as
/// [`DeviceError::ReadFailed`] carrying the backend result code.
pub trait AxisSource: Send {
    /// Read every axis of `device_id` using the capture `flags`.
    fn poll_axes(&mut self, device_id: u32, flags: u32) -> Result<RawAxes, DeviceError>;

    /// Scan enumerated devices for a vendor/product match.
    fn find_device(&mut self, vendor_id: u16, product_id: u16) -> Option<u32>;
}

impl<T: AxisSource + ?Sized> AxisSource for Box<T> {
    fn poll_axes(&mut self, device_id: u32, flags: u32) -> Result<RawAxes, DeviceError> {
        (**self).poll_axes(device_id, flags)
    }

    fn find_device(&mut self, vendor_id: u16, product_id: u16) -> Option<u32> {
        (**self).find_device(vendor_id, product_id)
    }
}

pub mod mock {
    //! Deterministic [`AxisSource`] for tests and hardware-less runs.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Script {
        polls: VecDeque<Result<RawAxes, DeviceError>>,
        lookups: VecDeque<Option<u32>>,
        resting: RawAxes,
        poll_count: usize,
        lookup_count: usize,
        polled_ids: Vec<u32>,
    }

    /// Replays queued poll results and lookup answers.
    ///
    /// Once the poll queue is empty every poll returns the resting axes. Once
    /// the lookup queue is empty every lookup misses. Clones share the same
    /// script, so a test can keep a handle after moving the source into a
    /// sampling loop.
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedAxisSource {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedAxisSource {
        /// Source whose polls return `resting` until told otherwise.
        pub fn new(resting: RawAxes) -> Self {
            Self {
                script: Arc::new(Mutex::new(Script {
                    resting,
                    ..Script::default()
                })),
            }
        }

        fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
            let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut script)
        }

        pub fn queue_axes(&self, axes: RawAxes) {
            self.with_script(|s| s.polls.push_back(Ok(axes)));
        }

        pub fn queue_failure(&self, code: u32) {
            self.with_script(|s| s.polls.push_back(Err(DeviceError::ReadFailed { code })));
        }

        pub fn queue_lookup(&self, answer: Option<u32>) {
            self.with_script(|s| s.lookups.push_back(answer));
        }

        pub fn set_resting(&self, axes: RawAxes) {
            self.with_script(|s| s.resting = axes);
        }

        pub fn poll_count(&self) -> usize {
            self.with_script(|s| s.poll_count)
        }

        pub fn lookup_count(&self) -> usize {
            self.with_script(|s| s.lookup_count)
        }

        /// Device ids passed to every poll so far, in order.
        pub fn polled_ids(&self) -> Vec<u32> {
            self.with_script(|s| s.polled_ids.clone())
        }
    }

    impl AxisSource for ScriptedAxisSource {
        fn poll_axes(&mut self, device_id: u32, _flags: u32) -> Result<RawAxes, DeviceError> {
            self.with_script(|s| {
                s.poll_count = s.poll_count.saturating_add(1);
                s.polled_ids.push(device_id);
                s.polls.pop_front().unwrap_or(Ok(s.resting))
            })
        }

        fn find_device(&mut self, _vendor_id: u16, _product_id: u16) -> Option<u32> {
            self.with_script(|s| {
                s.lookup_count = s.lookup_count.saturating_add(1);
                s.lookups.pop_front().flatten()
            })
        }
    }
}
