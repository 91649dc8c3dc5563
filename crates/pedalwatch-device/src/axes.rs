//! Raw axis values and axis selection.

use std::fmt;
use std::str::FromStr;

use pedalwatch_errors::ConfigError;
use serde::Serialize;

/// The six analog axes reported by a joystick poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RawAxes {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub r: u32,
    pub u: u32,
    pub v: u32,
}

impl RawAxes {
    /// Every axis at the same value.
    pub const fn splat(value: u32) -> Self {
        Self {
            x: value,
            y: value,
            z: value,
            r: value,
            u: value,
            v: value,
        }
    }

    /// Value of the selected axis.
    pub fn get(&self, axis: AxisSelector) -> u32 {
        match axis {
            AxisSelector::X => self.x,
            AxisSelector::Y => self.y,
            AxisSelector::Z => self.z,
            AxisSelector::R => self.r,
            AxisSelector::U => self.u,
            AxisSelector::V => self.v,
        }
    }

    /// Copy with the selected axis replaced.
    pub fn with(mut self, axis: AxisSelector, value: u32) -> Self {
        let slot = match axis {
            AxisSelector::X => &mut self.x,
            AxisSelector::Y => &mut self.y,
            AxisSelector::Z => &mut self.z,
            AxisSelector::R => &mut self.r,
            AxisSelector::U => &mut self.u,
            AxisSelector::V => &mut self.v,
        };
        *slot = value;
        self
    }
}

/// Which hardware axis a pedal is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisSelector {
    X,
    Y,
    Z,
    R,
    U,
    V,
}

impl AxisSelector {
    pub const ALL: [AxisSelector; 6] = [
        AxisSelector::X,
        AxisSelector::Y,
        AxisSelector::Z,
        AxisSelector::R,
        AxisSelector::U,
        AxisSelector::V,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisSelector::X => "x",
            AxisSelector::Y => "y",
            AxisSelector::Z => "z",
            AxisSelector::R => "r",
            AxisSelector::U => "u",
            AxisSelector::V => "v",
        }
    }
}

impl fmt::Display for AxisSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisSelector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(AxisSelector::X),
            "y" => Ok(AxisSelector::Y),
            "z" => Ok(AxisSelector::Z),
            "r" => Ok(AxisSelector::R),
            "u" => Ok(AxisSelector::U),
            "v" => Ok(AxisSelector::V),
            _ => Err(ConfigError::InvalidAxis(s.to_string())),
        }
    }
}

/// Hardware axes feeding the gas, clutch and brake pedals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedalAxisMap {
    pub gas: AxisSelector,
    pub clutch: AxisSelector,
    pub brake: AxisSelector,
}

impl Default for PedalAxisMap {
    fn default() -> Self {
        Self {
            gas: AxisSelector::Y,
            clutch: AxisSelector::R,
            brake: AxisSelector::Z,
        }
    }
}

impl PedalAxisMap {
    /// Gas, clutch and brake values out of one poll.
    pub fn pick(&self, axes: &RawAxes) -> (u32, u32, u32) {
        (axes.get(self.gas), axes.get(self.clutch), axes.get(self.brake))
    }
}
