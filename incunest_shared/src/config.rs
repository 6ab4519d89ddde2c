//! Shared configuration logic for the tool server, the simulator shell, and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    DEFAULT_AMBIENT_TEMP, DEFAULT_HUMIDITY, DEFAULT_SETPOINT, DEFAULT_TEMPERATURE, HUMIDITY_MAX,
    HUMIDITY_MIN, SETPOINT_MAX, SETPOINT_MIN, TEMPERATURE_MAX, TEMPERATURE_MIN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller gains, physics coefficients and power-on values of the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_kp")]
    pub kp: f64,
    #[serde(default = "default_ki")]
    pub ki: f64,
    #[serde(default = "default_kd")]
    pub kd: f64,
    /// Heater is on while the PID output exceeds this value.
    #[serde(default = "default_heater_threshold")]
    pub heater_threshold: f64,
    /// °C per second added while the heater is on.
    #[serde(default = "default_heat_rate")]
    pub heat_rate: f64,
    /// Fraction of the chamber/ambient difference lost per second.
    #[serde(default = "default_loss_coefficient")]
    pub loss_coefficient: f64,
    /// Fraction of the distance to the fan target covered per second.
    #[serde(default = "default_fan_blend")]
    pub fan_blend: f64,
    /// %RH per second gained while heating.
    #[serde(default = "default_humidify_rate")]
    pub humidify_rate: f64,
    /// %RH per second lost while not heating.
    #[serde(default = "default_dry_rate")]
    pub dry_rate: f64,
    #[serde(default = "default_ambient_temp")]
    pub ambient_temp: f64,
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    #[serde(default = "default_initial_setpoint")]
    pub initial_setpoint: f64,
    #[serde(default = "default_initial_humidity")]
    pub initial_humidity: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki: default_ki(),
            kd: default_kd(),
            heater_threshold: default_heater_threshold(),
            heat_rate: default_heat_rate(),
            loss_coefficient: default_loss_coefficient(),
            fan_blend: default_fan_blend(),
            humidify_rate: default_humidify_rate(),
            dry_rate: default_dry_rate(),
            ambient_temp: default_ambient_temp(),
            initial_temperature: default_initial_temperature(),
            initial_setpoint: default_initial_setpoint(),
            initial_humidity: default_initial_humidity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,
    #[serde(default = "default_server_version")]
    pub version: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
            protocol_version: default_protocol_version(),
        }
    }
}

/// Shape of the synthesized sensor history.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_samples")]
    pub samples: usize,
    #[serde(default = "default_history_duration")]
    pub default_duration_secs: f64,
    #[serde(default = "default_base_temperature")]
    pub base_temperature: f64,
    #[serde(default = "default_temperature_jitter")]
    pub temperature_jitter: f64,
    #[serde(default = "default_base_humidity")]
    pub base_humidity: f64,
    #[serde(default = "default_humidity_jitter")]
    pub humidity_jitter: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            samples: default_history_samples(),
            default_duration_secs: default_history_duration(),
            base_temperature: default_base_temperature(),
            temperature_jitter: default_temperature_jitter(),
            base_humidity: default_base_humidity(),
            humidity_jitter: default_humidity_jitter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_kp() -> f64 { 0.5 }
fn default_ki() -> f64 { 0.01 }
fn default_kd() -> f64 { 0.1 }
fn default_heater_threshold() -> f64 { 0.1 }
fn default_heat_rate() -> f64 { 0.01 }
fn default_loss_coefficient() -> f64 { 0.002 }
fn default_fan_blend() -> f64 { 0.005 }
fn default_humidify_rate() -> f64 { 0.1 }
fn default_dry_rate() -> f64 { 0.05 }
fn default_ambient_temp() -> f64 { DEFAULT_AMBIENT_TEMP }
fn default_initial_temperature() -> f64 { DEFAULT_TEMPERATURE }
fn default_initial_setpoint() -> f64 { DEFAULT_SETPOINT }
fn default_initial_humidity() -> f64 { DEFAULT_HUMIDITY }
fn default_server_name() -> String { "incunest-sim-server".to_string() }
fn default_server_version() -> String { "1.0.0".to_string() }
fn default_protocol_version() -> String { "2024-11-05".to_string() }
fn default_history_samples() -> usize { 10 }
fn default_history_duration() -> f64 { 3600.0 }
fn default_base_temperature() -> f64 { 36.5 }
fn default_temperature_jitter() -> f64 { 1.0 }
fn default_base_humidity() -> f64 { 65.0 }
fn default_humidity_jitter() -> f64 { 5.0 }
fn default_log_level() -> String { "info".to_string() }

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), String> {
        let coefficients = [
            ("kp", self.kp),
            ("ki", self.ki),
            ("kd", self.kd),
            ("heat_rate", self.heat_rate),
            ("loss_coefficient", self.loss_coefficient),
            ("fan_blend", self.fan_blend),
            ("humidify_rate", self.humidify_rate),
            ("dry_rate", self.dry_rate),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("simulation.{name} must be a finite, non-negative number"));
            }
        }
        if !self.heater_threshold.is_finite() || !self.ambient_temp.is_finite() {
            return Err("simulation.heater_threshold and ambient_temp must be finite".to_string());
        }
        if !(TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&self.initial_temperature) {
            return Err(format!(
                "simulation.initial_temperature must be between {TEMPERATURE_MIN} and {TEMPERATURE_MAX}"
            ));
        }
        if !(SETPOINT_MIN..=SETPOINT_MAX).contains(&self.initial_setpoint) {
            return Err(format!(
                "simulation.initial_setpoint must be between {SETPOINT_MIN} and {SETPOINT_MAX}"
            ));
        }
        if !(HUMIDITY_MIN..=HUMIDITY_MAX).contains(&self.initial_humidity) {
            return Err(format!(
                "simulation.initial_humidity must be between {HUMIDITY_MIN} and {HUMIDITY_MAX}"
            ));
        }
        Ok(())
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.samples == 0 {
            return Err("history.samples must be at least 1".to_string());
        }
        if !self.default_duration_secs.is_finite() || self.default_duration_secs <= 0.0 {
            return Err("history.default_duration_secs must be positive".to_string());
        }
        if self.temperature_jitter < 0.0 || self.humidity_jitter < 0.0 {
            return Err("history jitter must be non-negative".to_string());
        }
        Ok(())
    }
}

impl Config {
    /// Validate all sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate().map_err(ConfigError::Invalid)?;
        self.history.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config: Config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}

/// Load `path` if given, otherwise fall back to the built-in defaults.
pub fn load_or_default(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}
