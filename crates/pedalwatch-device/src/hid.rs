//! hidapi-backed axis source.
//!
//! Joystick ids are indices into the enumerated list of generic-desktop
//! joystick and gamepad interfaces, in hidapi's enumeration order.

use hidapi::{DeviceInfo, HidApi, HidDevice};
use pedalwatch_errors::DeviceError;
use tracing::{debug, warn};

use crate::axes::RawAxes;
use crate::report::AxisReportLayout;
use crate::source::{AxisSource, POLL_BAD_DEVICE, POLL_UNPLUGGED};

const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
const USAGE_JOYSTICK: u16 = 0x04;
const USAGE_GAMEPAD: u16 = 0x05;
const READ_TIMEOUT_MS: i32 = 50;
const RAW_DATA_FLAG: u32 = 256;

fn is_joystick(info: &DeviceInfo) -> bool {
    info.usage_page() == USAGE_PAGE_GENERIC_DESKTOP
        && matches!(info.usage(), USAGE_JOYSTICK | USAGE_GAMEPAD)
}

/// Polls a joystick-class HID interface for axis reports.
pub struct HidAxisSource {
    api: HidApi,
    layout: AxisReportLayout,
    open: Option<(u32, HidDevice)>,
    last_axes: RawAxes,
}

impl HidAxisSource {
    /// Initialise hidapi and enumerate devices.
    pub fn new(layout: AxisReportLayout) -> Result<Self, DeviceError> {
        let api = HidApi::new().map_err(|e| DeviceError::BackendUnavailable(e.to_string()))?;
        Ok(Self {
            api,
            layout,
            open: None,
            last_axes: RawAxes::default(),
        })
    }

    fn joysticks(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.api.device_list().filter(|info| is_joystick(info))
    }

    fn ensure_open(&mut self, device_id: u32) -> Result<&HidDevice, DeviceError> {
        let stale = !matches!(&self.open, Some((id, _)) if *id == device_id);
        if stale {
            self.open = None;
            let index = usize::try_from(device_id).map_err(|e| {
                debug!(error = %e, device_id, "device id out of range");
                DeviceError::ReadFailed {
                    code: POLL_BAD_DEVICE,
                }
            })?;
            let info = self.joysticks().nth(index).ok_or(DeviceError::ReadFailed {
                code: POLL_BAD_DEVICE,
            })?;
            let device = info.open_device(&self.api).map_err(|e| {
                warn!(error = %e, device_id, "failed to open joystick");
                DeviceError::ReadFailed {
                    code: POLL_UNPLUGGED,
                }
            })?;
            self.open = Some((device_id, device));
        }

        match &self.open {
            Some((_, device)) => Ok(device),
            None => Err(DeviceError::ReadFailed {
                code: POLL_BAD_DEVICE,
            }),
        }
    }
}

impl AxisSource for HidAxisSource {
    fn poll_axes(&mut self, device_id: u32, flags: u32) -> Result<RawAxes, DeviceError> {
        let layout = self.layout;
        let mut buf = [0u8; 64];

        let read = {
            let device = self.ensure_open(device_id)?;
            device.read_timeout(&mut buf, READ_TIMEOUT_MS)
        };

        match read {
            // No new report inside the timeout: the axes have not moved.
            Ok(0) => Ok(self.last_axes),
            Ok(n) => {
                let report = buf.get(..n).unwrap_or(&[]);
                let axes = layout
                    .parse(report, flags & RAW_DATA_FLAG != 0)
                    .ok_or(DeviceError::ReadFailed {
                        code: POLL_BAD_DEVICE,
                    })?;
                self.last_axes = axes;
                Ok(axes)
            }
            Err(e) => {
                debug!(error = %e, device_id, "joystick read failed");
                self.open = None;
                Err(DeviceError::ReadFailed {
                    code: POLL_UNPLUGGED,
                })
            }
        }
    }

    fn find_device(&mut self, vendor_id: u16, product_id: u16) -> Option<u32> {
        if let Err(e) = self.api.refresh_devices() {
            warn!(error = %e, "hid device refresh failed");
            return None;
        }
        self.open = None;
        let index = self
            .joysticks()
            .position(|info| info.vendor_id() == vendor_id && info.product_id() == product_id)?;
        u32::try_from(index).ok()
    }
}
