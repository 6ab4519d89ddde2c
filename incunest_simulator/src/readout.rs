//! Text readouts shown next to the 3D view, keyed by element id.

use incunest_shared::SimulationData;
use serde::Serialize;

pub const TEMP_INTERNAL: &str = "temp-internal";
pub const TEMP_SETPOINT: &str = "temp-setpoint";
pub const HUMIDITY: &str = "humidity";
pub const HEATER_STATUS: &str = "heater-status";
pub const FAN_STATUS: &str = "fan-status";

pub const READOUT_IDS: [&str; 5] =
    [TEMP_INTERNAL, TEMP_SETPOINT, HUMIDITY, HEATER_STATUS, FAN_STATUS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readouts {
    pub temp_internal: String,
    pub temp_setpoint: String,
    pub humidity: String,
    pub heater_status: String,
    pub fan_status: String,
}

impl Readouts {
    pub fn element(&self, id: &str) -> Option<&str> {
        match id {
            TEMP_INTERNAL => Some(&self.temp_internal),
            TEMP_SETPOINT => Some(&self.temp_setpoint),
            HUMIDITY => Some(&self.humidity),
            HEATER_STATUS => Some(&self.heater_status),
            FAN_STATUS => Some(&self.fan_status),
            _ => None,
        }
    }
}

impl From<&SimulationData> for Readouts {
    fn from(data: &SimulationData) -> Self {
        Self {
            temp_internal: format!("{:.1}°C", data.temperature),
            temp_setpoint: format!("{:.1}°C", data.setpoint),
            humidity: format!("{:.0}%", data.humidity),
            heater_status: on_off(data.heater_on).to_string(),
            fan_status: on_off(data.fan_on).to_string(),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
