//! State record owned by the tool server.
//!
//! Constructed once at start with the engine's power-on values and mutated only
//! by validated tool calls. It is not connected to any running engine.

use chrono::{DateTime, Utc};
use incunest_shared::config::SimulationConfig;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStateSnapshot {
    pub temperature: f64,
    pub humidity: f64,
    pub setpoint: f64,
    pub heater_on: bool,
    pub fan_on: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ToolServerState {
    record: ToolStateSnapshot,
}

impl ToolServerState {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            record: ToolStateSnapshot {
                temperature: config.initial_temperature,
                humidity: config.initial_humidity,
                setpoint: config.initial_setpoint,
                heater_on: true,
                fan_on: true,
                timestamp: Utc::now(),
            },
        }
    }

    pub fn snapshot(&self) -> ToolStateSnapshot {
        self.record.clone()
    }

    /// Caller validates the range.
    pub fn set_setpoint(&mut self, temperature: f64) {
        self.record.setpoint = temperature;
        self.touch();
    }

    pub fn set_heater(&mut self, on: bool) {
        self.record.heater_on = on;
        self.touch();
    }

    pub fn set_fan(&mut self, on: bool) {
        self.record.fan_on = on;
        self.touch();
    }

    fn touch(&mut self) {
        self.record.timestamp = Utc::now();
    }
}

impl Default for ToolServerState {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}
