//! Axis extraction from generic joystick input reports.
//!
//! Gamepad-class pedal sets typically report their axes as consecutive
//! little-endian 16-bit values. [`AxisReportLayout`] describes where they
//! start and how many there are.

use crate::axes::{AxisSelector, RawAxes};

/// Position of the axis block inside an input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisReportLayout {
    /// Byte offset of the first axis (1 skips a leading report ID).
    pub offset: usize,
    /// Number of 16-bit axes present, mapped in `x, y, z, r, u, v` order.
    pub axis_count: usize,
}

impl Default for AxisReportLayout {
    fn default() -> Self {
        Self {
            offset: 1,
            axis_count: 6,
        }
    }
}

impl AxisReportLayout {
    /// Bytes the report must contain for every axis to be read.
    pub fn required_len(&self) -> usize {
        self.offset.saturating_add(self.axis_count.saturating_mul(2))
    }

    /// Decode the axes out of `report`.
    ///
    /// Returns `None` for a short report. Axes beyond `axis_count` stay 0.
    /// In raw mode the 16-bit values are reduced to the 10-bit raw range.
    pub fn parse(&self, report: &[u8], raw_mode: bool) -> Option<RawAxes> {
        let block = report.get(self.offset..self.required_len())?;

        let mut axes = RawAxes::default();
        for (axis, bytes) in AxisSelector::ALL.into_iter().zip(block.chunks_exact(2)) {
            let [lo, hi] = bytes else {
                return None;
            };
            let value = u32::from(u16::from_le_bytes([*lo, *hi]));
            let value = if raw_mode { value >> 6 } else { value };
            axes = axes.with(axis, value);
        }
        Some(axes)
    }
}
