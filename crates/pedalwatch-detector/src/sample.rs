//! One iteration's pedal readings, normalized and converted to percentages.

use pedalwatch_calibration::{
    CalibrationConfig, compute_logical_pct, normalize_pedal_axis, physical_pct,
};
use serde::Serialize;

/// Raw hardware values for the three mapped pedals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawPedals {
    pub gas: u32,
    pub clutch: u32,
    pub brake: u32,
}

/// Readings for a single pedal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PedalReading {
    pub raw: u32,
    pub value: u32,
    pub physical_pct: u32,
    pub logical_pct: u32,
}

impl PedalReading {
    fn new(raw: u32, config: &CalibrationConfig, idle_max: u32, full_min: u32) -> Self {
        let axis_max = config.axis_max();
        let value = normalize_pedal_axis(raw, axis_max, config.axis_normalization_enabled());
        Self {
            raw,
            value,
            physical_pct: physical_pct(value, axis_max),
            logical_pct: compute_logical_pct(value, idle_max, full_min),
        }
    }
}

/// Gas, clutch and brake readings for one sampling iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PedalSample {
    pub gas: PedalReading,
    pub clutch: PedalReading,
    pub brake: PedalReading,
}

impl PedalSample {
    /// Normalize `raw` against `config` and derive every percentage.
    pub fn from_raw(raw: RawPedals, config: &CalibrationConfig) -> Self {
        Self {
            gas: PedalReading::new(
                raw.gas,
                config,
                config.gas_idle_max(),
                config.gas_full_min(),
            ),
            clutch: PedalReading::new(
                raw.clutch,
                config,
                config.clutch_idle_max(),
                config.clutch_full_min(),
            ),
            brake: PedalReading::new(
                raw.brake,
                config,
                config.brake_idle_max(),
                config.brake_full_min(),
            ),
        }
    }
}

// Flat wire shape: rawGas, gasValue, gasPhysicalPct, gasLogicalPct, ...
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SampleWire {
    raw_gas: u32,
    raw_clutch: u32,
    raw_brake: u32,
    gas_value: u32,
    clutch_value: u32,
    brake_value: u32,
    gas_physical_pct: u32,
    clutch_physical_pct: u32,
    brake_physical_pct: u32,
    gas_logical_pct: u32,
    clutch_logical_pct: u32,
    brake_logical_pct: u32,
}

impl Serialize for PedalSample {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        SampleWire {
            raw_gas: self.gas.raw,
            raw_clutch: self.clutch.raw,
            raw_brake: self.brake.raw,
            gas_value: self.gas.value,
            clutch_value: self.clutch.value,
            brake_value: self.brake.value,
            gas_physical_pct: self.gas.physical_pct,
            clutch_physical_pct: self.clutch.physical_pct,
            brake_physical_pct: self.brake.physical_pct,
            gas_logical_pct: self.gas.logical_pct,
            clutch_logical_pct: self.clutch.logical_pct,
            brake_logical_pct: self.brake.logical_pct,
        }
        .serialize(serializer)
    }
}
