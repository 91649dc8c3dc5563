//! Device polling with disconnect latching and vendor/product rescans.
//!
//! Read failures never leave this module as errors. They become
//! [`PollOutcome`] variants the sampling loop turns into frames and alerts.

use pedalwatch_detector::RuntimeState;
use pedalwatch_device::{AxisSource, DeviceIdentity, POLL_BAD_DEVICE, RawAxes};
use pedalwatch_errors::DeviceError;
use tracing::{info, warn};

/// What a single poll produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Sample(RawAxes),
    /// First failure after being connected. Only raised with an identity.
    Disconnected { code: u32 },
    /// Failure while already latched.
    StillDisconnected { code: u32 },
    /// Failure with no identity to rescan for; retried at the normal cadence.
    ReadFailed { code: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescanOutcome {
    Reconnected { device_id: u32 },
    NotFound,
}

pub struct ConnectionManager<S> {
    source: S,
    device_id: u32,
    flags: u32,
    identity: Option<DeviceIdentity>,
}

impl<S: AxisSource> ConnectionManager<S> {
    /// Resolve the device to poll.
    ///
    /// With an identity the enumerated devices are searched first. A miss
    /// falls back to `joystick` if one was given, otherwise it is fatal.
    pub fn startup_detect(
        mut source: S,
        joystick: Option<u32>,
        identity: Option<DeviceIdentity>,
        flags: u32,
    ) -> Result<Self, DeviceError> {
        let found = identity.and_then(|id| source.find_device(id.vendor_id, id.product_id));

        let device_id = match (found, joystick, identity) {
            (Some(device_id), _, Some(id)) => {
                info!(device_id, identity = %id, "Auto-detected controller");
                device_id
            }
            (None, Some(joystick), Some(id)) => {
                warn!(
                    identity = %id,
                    joystick,
                    "Controller not found at startup, using configured joystick id"
                );
                joystick
            }
            (_, Some(joystick), None) => joystick,
            (_, None, id) => {
                let (vendor_id, product_id) =
                    id.map_or((0, 0), |id| (id.vendor_id, id.product_id));
                return Err(DeviceError::NotFound {
                    vendor_id,
                    product_id,
                });
            }
        };

        Ok(Self {
            source,
            device_id,
            flags,
            identity,
        })
    }

    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.identity
    }

    /// Whether the next step should look for the device instead of polling it.
    pub fn needs_rescan(&self, state: &RuntimeState) -> bool {
        self.identity.is_some() && state.connection.disconnected
    }

    /// Poll the current device and update the latch on failure.
    pub fn poll(&mut self, state: &mut RuntimeState, now_ms: u64) -> PollOutcome {
        let code = match self.source.poll_axes(self.device_id, self.flags) {
            Ok(axes) => return PollOutcome::Sample(axes),
            Err(DeviceError::ReadFailed { code }) => code,
            Err(other) => {
                warn!(device_id = self.device_id, error = %other, "poll failed");
                POLL_BAD_DEVICE
            }
        };

        if self.identity.is_none() {
            return PollOutcome::ReadFailed { code };
        }
        if state.connection.mark_disconnected(now_ms) {
            warn!(device_id = self.device_id, code, "Controller disconnected");
            PollOutcome::Disconnected { code }
        } else {
            PollOutcome::StillDisconnected { code }
        }
    }

    /// Look for the configured identity. A match releases the latch and
    /// resets `state` to its initial values.
    pub fn rescan(&mut self, state: &mut RuntimeState, now_ms: u64) -> RescanOutcome {
        let Some(identity) = self.identity else {
            return RescanOutcome::NotFound;
        };
        match self
            .source
            .find_device(identity.vendor_id, identity.product_id)
        {
            Some(device_id) => {
                self.device_id = device_id;
                state.connection.mark_reconnected(now_ms);
                state.reset(now_ms);
                info!(device_id, identity = %identity, "Controller reconnected");
                RescanOutcome::Reconnected { device_id }
            }
            None => {
                info!(identity = %identity, "Controller not found, retrying");
                RescanOutcome::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pedalwatch_device::mock::ScriptedAxisSource;
    use pedalwatch_device::POLL_UNPLUGGED;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const FANATEC: DeviceIdentity = DeviceIdentity {
        vendor_id: 0x0EB7,
        product_id: 0x1839,
    };

    #[test]
    fn test_startup_prefers_detected_id() -> TestResult {
        let source = ScriptedAxisSource::new(RawAxes::default());
        source.queue_lookup(Some(7));
        let manager = ConnectionManager::startup_detect(source, Some(2), Some(FANATEC), 0)?;
        assert_eq!(manager.device_id(), 7);
        Ok(())
    }

    #[test]
    fn test_startup_falls_back_to_joystick() -> TestResult {
        let source = ScriptedAxisSource::new(RawAxes::default());
        let manager = ConnectionManager::startup_detect(source, Some(2), Some(FANATEC), 0)?;
        assert_eq!(manager.device_id(), 2);
        Ok(())
    }

    #[test]
    fn test_startup_without_any_id_is_fatal() {
        let source = ScriptedAxisSource::new(RawAxes::default());
        let result = ConnectionManager::startup_detect(source, None, Some(FANATEC), 0);
        assert!(matches!(
            result,
            Err(DeviceError::NotFound {
                vendor_id: 0x0EB7,
                product_id: 0x1839
            })
        ));
    }

    #[test]
    fn test_failures_latch_once() -> TestResult {
        let source = ScriptedAxisSource::new(RawAxes::default());
        for _ in 0..3 {
            source.queue_failure(POLL_UNPLUGGED);
        }
        let mut manager = ConnectionManager::startup_detect(source, Some(0), Some(FANATEC), 0)?;
        let mut state = RuntimeState::new(0);

        assert_eq!(
            manager.poll(&mut state, 10),
            PollOutcome::Disconnected {
                code: POLL_UNPLUGGED
            }
        );
        assert_eq!(
            manager.poll(&mut state, 20),
            PollOutcome::StillDisconnected {
                code: POLL_UNPLUGGED
            }
        );
        assert_eq!(
            manager.poll(&mut state, 30),
            PollOutcome::StillDisconnected {
                code: POLL_UNPLUGGED
            }
        );
        assert_eq!(state.connection.last_disconnect_time, Some(10));
        assert!(manager.needs_rescan(&state));
        Ok(())
    }

    #[test]
    fn test_failure_without_identity_does_not_latch() -> TestResult {
        let source = ScriptedAxisSource::new(RawAxes::default());
        source.queue_failure(POLL_BAD_DEVICE);
        let mut manager = ConnectionManager::startup_detect(source, Some(3), None, 0)?;
        let mut state = RuntimeState::new(0);

        assert_eq!(
            manager.poll(&mut state, 5),
            PollOutcome::ReadFailed {
                code: POLL_BAD_DEVICE
            }
        );
        assert!(!state.connection.disconnected);
        assert!(!manager.needs_rescan(&state));
        Ok(())
    }

    /// Backend that has lost its transport entirely.
    struct UnavailableSource;

    impl AxisSource for UnavailableSource {
        fn poll_axes(&mut self, _device_id: u32, _flags: u32) -> Result<RawAxes, DeviceError> {
            Err(DeviceError::BackendUnavailable("hid context closed".to_string()))
        }

        fn find_device(&mut self, _vendor_id: u16, _product_id: u16) -> Option<u32> {
            None
        }
    }

    #[test]
    fn test_backend_error_reports_bad_device_code() -> TestResult {
        let mut manager =
            ConnectionManager::startup_detect(UnavailableSource, Some(1), Some(FANATEC), 0)?;
        let mut state = RuntimeState::new(0);
        assert_eq!(
            manager.poll(&mut state, 10),
            PollOutcome::Disconnected {
                code: POLL_BAD_DEVICE
            }
        );

        let mut manager = ConnectionManager::startup_detect(UnavailableSource, Some(1), None, 0)?;
        let mut state = RuntimeState::new(0);
        assert_eq!(
            manager.poll(&mut state, 10),
            PollOutcome::ReadFailed {
                code: POLL_BAD_DEVICE
            }
        );
        Ok(())
    }

    #[test]
    fn test_rescan_reconnects_and_resets_state() -> TestResult {
        let source = ScriptedAxisSource::new(RawAxes::default());
        source.queue_failure(POLL_UNPLUGGED);
        source.queue_lookup(Some(0));
        source.queue_lookup(None);
        source.queue_lookup(Some(4));
        let handle = source.clone();
        let mut manager = ConnectionManager::startup_detect(source, None, Some(FANATEC), 0)?;
        let mut state = RuntimeState::new(0);
        state.is_racing = true;
        state.best_estimate_percent = 61;

        manager.poll(&mut state, 100);
        assert_eq!(manager.rescan(&mut state, 60_100), RescanOutcome::NotFound);
        assert!(state.connection.disconnected);

        assert_eq!(
            manager.rescan(&mut state, 120_100),
            RescanOutcome::Reconnected { device_id: 4 }
        );
        assert_eq!(manager.device_id(), 4);
        assert!(!state.connection.disconnected);
        assert_eq!(state.connection.last_reconnect_time, Some(120_100));
        assert_eq!(state.connection.last_disconnect_time, Some(100));
        assert!(!state.is_racing);
        assert_eq!(state.best_estimate_percent, 100);
        assert_eq!(state.last_full_throttle_time, 120_100);

        manager.poll(&mut state, 121_100);
        assert_eq!(handle.polled_ids(), vec![0, 4]);
        Ok(())
    }
}
