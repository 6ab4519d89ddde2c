// Temperature controller chip: PID with anti-windup, bang-bang heater output

use super::{Timer, adc_to_temperature};
use incunest_shared::{DEFAULT_SETPOINT, DEFAULT_TEMPERATURE, PidController};

pub const UPDATE_INTERVAL_SECS: f64 = 1.0;
pub const KP: f64 = 2.0;
pub const KI: f64 = 0.5;
pub const KD: f64 = 1.0;
pub const INTEGRAL_LIMIT: f64 = 10.0;
/// Heater output goes high above this PID output.
pub const OUTPUT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct TemperatureControllerChip {
    pub current_temp: f64,
    pub setpoint: f64,
    pub heater_on: bool,
    pid: PidController,
    timer: Timer,
}

impl Default for TemperatureControllerChip {
    fn default() -> Self {
        Self::new()
    }
}

impl TemperatureControllerChip {
    pub fn new() -> Self {
        Self {
            current_temp: DEFAULT_TEMPERATURE,
            setpoint: DEFAULT_SETPOINT,
            heater_on: false,
            pid: PidController::new(KP, KI, KD).with_integral_limit(INTEGRAL_LIMIT),
            timer: Timer::new(UPDATE_INTERVAL_SECS),
        }
    }

    pub(crate) fn poll(&mut self, dt: f64) -> u32 {
        self.timer.poll(dt)
    }

    /// Sample the temperature input and drive the heater output.
    pub fn tick(&mut self, temp_adc: u32) -> bool {
        self.current_temp = adc_to_temperature(temp_adc);
        let error = self.setpoint - self.current_temp;
        let output = self.pid.output(error, self.timer.period());
        self.heater_on = output > OUTPUT_THRESHOLD;
        tracing::trace!(
            "Temp: {:.1}°C, Setpoint: {:.1}°C, Error: {:.2}, Heater: {}",
            self.current_temp,
            self.setpoint,
            error,
            if self.heater_on { "ON" } else { "OFF" }
        );
        self.heater_on
    }

    pub fn integral(&self) -> f64 {
        self.pid.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wokwi::temperature_to_dac;

    #[test]
    fn heats_when_cold() {
        let mut chip = TemperatureControllerChip::new();
        assert!(chip.tick(temperature_to_dac(24.0)));
    }

    #[test]
    fn idles_when_hot() {
        let mut chip = TemperatureControllerChip::new();
        assert!(!chip.tick(temperature_to_dac(45.0)));
    }

    #[test]
    fn integral_is_bounded() {
        let mut chip = TemperatureControllerChip::new();
        for _ in 0..100 {
            chip.tick(0);
        }
        assert_eq!(chip.integral(), INTEGRAL_LIMIT);
    }
}
