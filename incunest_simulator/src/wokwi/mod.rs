//! Co-simulation of the Wokwi custom chips wired to the incubator.
//!
//! The heater element and the temperature controller chip each run on their
//! own fixed timer. The bridge steps both from frame time and turns their
//! outputs into sparse [`WokwiUpdate`]s for the engine.

pub mod controller;
pub mod heater_element;

pub use controller::TemperatureControllerChip;
pub use heater_element::HeaterElement;

use incunest_shared::WokwiUpdate;

/// Full scale of the chips' 12-bit converters.
pub const ADC_FULL_SCALE: f64 = 4095.0;
/// Temperature mapped to code 0.
pub const ANALOG_TEMP_MIN: f64 = 20.0;
/// Span mapped onto the full converter range.
pub const ANALOG_TEMP_SPAN: f64 = 30.0;

/// Encode a temperature as a 12-bit DAC code (20–50 °C).
pub fn temperature_to_dac(temperature: f64) -> u32 {
    let normalized = ((temperature - ANALOG_TEMP_MIN) / ANALOG_TEMP_SPAN).clamp(0.0, 1.0);
    (normalized * ADC_FULL_SCALE) as u32
}

/// Decode a 12-bit ADC code back to °C.
pub fn adc_to_temperature(code: u32) -> f64 {
    ANALOG_TEMP_MIN + (code as f64 / ADC_FULL_SCALE) * ANALOG_TEMP_SPAN
}

#[derive(Debug, Clone)]
pub struct WokwiBridge {
    pub heater: HeaterElement,
    pub controller: TemperatureControllerChip,
}

impl Default for WokwiBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl WokwiBridge {
    pub fn new() -> Self {
        Self {
            heater: HeaterElement::new(heater_element::DEFAULT_POWER_WATTS),
            controller: TemperatureControllerChip::new(),
        }
    }

    /// Advance both chips by `dt` seconds.
    ///
    /// Returns an update when at least one chip timer fired, carrying the
    /// heater element temperature and the controller's heater decision.
    pub fn advance(&mut self, dt: f64, setpoint: f64) -> Option<WokwiUpdate> {
        self.controller.setpoint = setpoint;
        let mut fired = false;

        for _ in 0..self.controller.poll(dt) {
            let heater_on = self.controller.tick(self.heater.feedback());
            self.heater.set_control(heater_on);
            fired = true;
        }
        for _ in 0..self.heater.poll(dt) {
            self.heater.tick();
            fired = true;
        }

        fired.then(|| WokwiUpdate {
            temperature: Some(self.heater.temperature),
            heater_on: Some(self.controller.heater_on),
            ..Default::default()
        })
    }
}

/// Accumulates elapsed time and reports how many whole periods have passed.
#[derive(Debug, Clone)]
pub(crate) struct Timer {
    period: f64,
    accumulated: f64,
}

impl Timer {
    pub(crate) fn new(period: f64) -> Self {
        Self {
            period,
            accumulated: 0.0,
        }
    }

    pub(crate) fn period(&self) -> f64 {
        self.period
    }

    pub(crate) fn poll(&mut self, dt: f64) -> u32 {
        if dt > 0.0 {
            self.accumulated += dt;
        }
        let mut fired = 0;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_mapping_round_trips_within_one_code() {
        let code = temperature_to_dac(37.0);
        assert!((adc_to_temperature(code) - 37.0).abs() < ANALOG_TEMP_SPAN / ADC_FULL_SCALE);
    }

    #[test]
    fn converter_saturates_outside_range() {
        assert_eq!(temperature_to_dac(10.0), 0);
        assert_eq!(temperature_to_dac(80.0), 4095);
    }

    #[test]
    fn timer_counts_whole_periods() {
        let mut timer = Timer::new(0.5);
        assert_eq!(timer.poll(0.3), 0);
        assert_eq!(timer.poll(0.3), 1);
        assert_eq!(timer.poll(1.0), 2);
        assert_eq!(timer.poll(-1.0), 0);
    }

    #[test]
    fn bridge_is_silent_until_a_timer_fires() {
        let mut bridge = WokwiBridge::new();
        assert!(bridge.advance(0.1, 37.0).is_none());
        let update = bridge.advance(0.5, 37.0).expect("heater timer fired");
        assert!(update.temperature.is_some());
        assert!(update.heater_on.is_some());
        assert!(update.humidity.is_none());
        assert!(update.fan_on.is_none());
    }

    #[test]
    fn bridge_heats_toward_setpoint_from_ambient() {
        let mut bridge = WokwiBridge::new();
        let start = bridge.heater.temperature;
        for _ in 0..20 {
            bridge.advance(0.5, 37.0);
        }
        assert!(bridge.heater.temperature > start);
    }
}
