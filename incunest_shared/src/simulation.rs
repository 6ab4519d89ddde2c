//! Incubator simulation engine.
//!
//! A single PID loop switches the heater; simplified first-order terms model
//! heater input, loss to the room, fan circulation and humidity. The engine is
//! advanced either from its clock (`update`) or by an explicit interval (`step`).

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::clock::{SystemClock, TimeSource};
use crate::config::SimulationConfig;
use crate::pid::PidController;
use crate::{
    HUMIDITY_MAX, HUMIDITY_MIN, SETPOINT_MAX, SETPOINT_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
};

/// Snapshot of the public engine state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationData {
    pub temperature: f64,
    pub setpoint: f64,
    pub humidity: f64,
    pub heater_on: bool,
    pub fan_on: bool,
    pub ambient_temp: f64,
}

/// Sparse overwrite pushed in by the Wokwi co-simulation.
///
/// Absent fields leave the engine untouched. Values are applied verbatim,
/// without the range checks of the setter path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WokwiUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heater_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_on: Option<bool>,
}

pub struct SimulationEngine {
    temperature: f64,
    setpoint: f64,
    humidity: f64,
    heater_on: bool,
    fan_on: bool,
    ambient_temp: f64,
    pid: PidController,
    config: SimulationConfig,
    clock: Arc<dyn TimeSource>,
    last_update: Instant,
}

impl fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("temperature", &self.temperature)
            .field("setpoint", &self.setpoint)
            .field("humidity", &self.humidity)
            .field("heater_on", &self.heater_on)
            .field("fan_on", &self.fan_on)
            .field("ambient_temp", &self.ambient_temp)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationEngine {
    /// Engine with the documented defaults, driven by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SimulationConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_clock(config: SimulationConfig, clock: Arc<dyn TimeSource>) -> Self {
        let last_update = clock.now();
        tracing::debug!(
            "Simulation engine created: T={:.1}°C, setpoint={:.1}°C, RH={:.0}%",
            config.initial_temperature,
            config.initial_setpoint,
            config.initial_humidity
        );
        Self {
            temperature: config.initial_temperature,
            setpoint: config.initial_setpoint,
            humidity: config.initial_humidity,
            heater_on: true,
            fan_on: true,
            ambient_temp: config.ambient_temp,
            pid: PidController::new(config.kp, config.ki, config.kd),
            config,
            clock,
            last_update,
        }
    }

    /// Advance by the clock time elapsed since the previous call (or since construction).
    pub fn update(&mut self) {
        let now = self.clock.now();
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        self.step(dt);
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let cfg = &self.config;

        // PID decides the heater every tick, overriding any manual toggle.
        let error = self.setpoint - self.temperature;
        let output = self.pid.output(error, dt);
        let heater_on = output > cfg.heater_threshold;
        if heater_on != self.heater_on {
            tracing::debug!(
                "Heater {} (output={:.3}, error={:.3})",
                if heater_on { "ON" } else { "OFF" },
                output,
                error
            );
        }
        self.heater_on = heater_on;

        if self.heater_on {
            self.temperature += cfg.heat_rate * dt;
        }

        // Loss to the room
        self.temperature -= (self.temperature - self.ambient_temp) * cfg.loss_coefficient * dt;

        if self.fan_on {
            let target = if self.heater_on { self.setpoint } else { self.ambient_temp };
            self.temperature += (target - self.temperature) * cfg.fan_blend * dt;
        }

        // Evaporation from the reservoir while heating
        if self.heater_on {
            self.humidity += cfg.humidify_rate * dt;
        } else {
            self.humidity -= cfg.dry_rate * dt;
        }
        self.humidity = self.humidity.clamp(HUMIDITY_MIN, HUMIDITY_MAX);
        self.temperature = self.temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX);
    }

    /// Owned copy of the public state; later mutation does not affect it.
    pub fn data(&self) -> SimulationData {
        SimulationData {
            temperature: self.temperature,
            setpoint: self.setpoint,
            humidity: self.humidity,
            heater_on: self.heater_on,
            fan_on: self.fan_on,
            ambient_temp: self.ambient_temp,
        }
    }

    /// Flip the heater flag. Only lasts until the next `update`/`step`.
    pub fn toggle_heater(&mut self) {
        self.heater_on = !self.heater_on;
        tracing::debug!("Heater toggled {}", if self.heater_on { "ON" } else { "OFF" });
    }

    pub fn toggle_fan(&mut self) {
        self.fan_on = !self.fan_on;
        tracing::debug!("Fan toggled {}", if self.fan_on { "ON" } else { "OFF" });
    }

    /// Set the target temperature, clamped to the accepted setpoint range.
    pub fn set_temperature_setpoint(&mut self, temp: f64) {
        if temp.is_nan() {
            tracing::warn!("Ignoring NaN temperature setpoint");
            return;
        }
        self.setpoint = temp.clamp(SETPOINT_MIN, SETPOINT_MAX);
        tracing::info!("Setting target temperature: {:.1}°C", self.setpoint);
    }

    /// Restore the power-on state and clear the controller.
    pub fn reset(&mut self) {
        self.temperature = self.config.initial_temperature;
        self.setpoint = self.config.initial_setpoint;
        self.humidity = self.config.initial_humidity;
        self.heater_on = true;
        self.fan_on = true;
        self.pid.reset();
        tracing::info!("Simulation reset");
    }

    /// Apply a sparse overwrite from the Wokwi side. No clamping is applied.
    pub fn set_from_wokwi(&mut self, update: &WokwiUpdate) {
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(humidity) = update.humidity {
            self.humidity = humidity;
        }
        if let Some(heater_on) = update.heater_on {
            self.heater_on = heater_on;
        }
        if let Some(fan_on) = update.fan_on {
            self.fan_on = fan_on;
        }
        tracing::trace!("Applied Wokwi update: {:?}", update);
    }

    pub fn integral(&self) -> f64 {
        self.pid.integral
    }

    pub fn last_error(&self) -> f64 {
        self.pid.last_error
    }
}
