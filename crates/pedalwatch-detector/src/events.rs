//! Per-sample detector outcomes.
//!
//! Serialized as the `events` object of a telemetry frame: flags as 0/1,
//! percentages as `null` when the event did not fire.

use serde::Serialize;

/// One-shot outcomes of a single [`evaluate`](crate::evaluate) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorEvents {
    /// Clutch noise threshold reached on this sample.
    pub clutch_alert: bool,
    /// Drift alert raised, carrying the peak percentage reached in the window.
    pub gas_alert: Option<u32>,
    /// Best deadzone estimate announced, carrying the new estimate.
    pub estimate_decreased: Option<u32>,
    /// Gas deadzone-out lowered to this value.
    pub auto_adjust: Option<u32>,
}

impl DetectorEvents {
    pub fn any(&self) -> bool {
        self.clutch_alert
            || self.gas_alert.is_some()
            || self.estimate_decreased.is_some()
            || self.auto_adjust.is_some()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventsWire {
    gas_alert_triggered: u8,
    gas_alert_percent: Option<u32>,
    clutch_alert_triggered: u8,
    gas_estimate_decreased: u8,
    gas_estimate_percent: Option<u32>,
    gas_auto_adjust_applied: u8,
}

impl Serialize for DetectorEvents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        EventsWire {
            gas_alert_triggered: u8::from(self.gas_alert.is_some()),
            gas_alert_percent: self.gas_alert,
            clutch_alert_triggered: u8::from(self.clutch_alert),
            gas_estimate_decreased: u8::from(self.estimate_decreased.is_some()),
            gas_estimate_percent: self.estimate_decreased,
            gas_auto_adjust_applied: u8::from(self.auto_adjust.is_some()),
        }
        .serialize(serializer)
    }
}
