//! USB identity used to find a controller again after it disappears.

use std::fmt;

use pedalwatch_errors::ConfigError;

/// Vendor/product pair of the monitored controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceIdentity {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Build an identity only when both ids are present and non-zero.
    pub fn from_parts(vendor_id: Option<u16>, product_id: Option<u16>) -> Option<Self> {
        match (vendor_id, product_id) {
            (Some(vid), Some(pid)) if vid != 0 && pid != 0 => Some(Self::new(vid, pid)),
            _ => None,
        }
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vendor_id, self.product_id)
    }
}

/// Parse a hexadecimal USB id such as `0EB7` or `0x0eb7`.
pub fn parse_hex_id(field: &'static str, input: &str) -> Result<u16, ConfigError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16)
        .ok()
        .ok_or_else(|| ConfigError::InvalidNumber {
            field,
            input: input.to_string(),
        })
}
