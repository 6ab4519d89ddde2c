// Heater element chip: resistive heater with first-order cooling

use super::{Timer, temperature_to_dac};
use incunest_shared::DEFAULT_AMBIENT_TEMP;

pub const UPDATE_INTERVAL_SECS: f64 = 0.5;
pub const DEFAULT_POWER_WATTS: f64 = 50.0;
/// °C per second at rated power
pub const HEAT_RATE: f64 = 0.5;
/// Fraction of the excess over ambient lost per second while off
pub const COOL_RATE: f64 = 0.1;
pub const MAX_TEMP: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct HeaterElement {
    pub temperature: f64,
    pub power_watts: f64,
    pub is_on: bool,
    timer: Timer,
}

impl HeaterElement {
    pub fn new(power_watts: f64) -> Self {
        tracing::debug!("Heater element initialized. Power: {:.0}W", power_watts);
        Self {
            temperature: DEFAULT_AMBIENT_TEMP,
            power_watts,
            is_on: false,
            timer: Timer::new(UPDATE_INTERVAL_SECS),
        }
    }

    /// Control pin edge.
    pub fn set_control(&mut self, high: bool) {
        if high != self.is_on {
            tracing::trace!("Heater element {}", if high { "ON" } else { "OFF" });
        }
        self.is_on = high;
    }

    pub(crate) fn poll(&mut self, dt: f64) -> u32 {
        self.timer.poll(dt)
    }

    /// One timer period of thermal update.
    pub fn tick(&mut self) {
        let dt = self.timer.period();
        if self.is_on {
            let heat_rate = HEAT_RATE * (self.power_watts / DEFAULT_POWER_WATTS);
            self.temperature = (self.temperature + heat_rate * dt).min(MAX_TEMP);
        } else {
            self.temperature -= COOL_RATE * (self.temperature - DEFAULT_AMBIENT_TEMP) * dt;
        }
    }

    /// Analog feedback pin value.
    pub fn feedback(&self) -> u32 {
        temperature_to_dac(self.temperature)
    }
}
