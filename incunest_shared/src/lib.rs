// incunest_shared: simulation engine and types shared by the tool server and the simulator shell

pub mod clock;
pub mod config;
pub mod pid;
pub mod simulation;

pub use clock::{SimClock, SystemClock, TimeSource};
pub use config::{Config, ConfigError, load_config};
pub use pid::PidController;
pub use simulation::{SimulationData, SimulationEngine, WokwiUpdate};

// --- Physical limits of the incubator chamber ---

/// Chamber temperature range in °C.
pub const TEMPERATURE_MIN: f64 = 25.0;
pub const TEMPERATURE_MAX: f64 = 40.0;

/// Accepted setpoint range in °C.
pub const SETPOINT_MIN: f64 = 30.0;
pub const SETPOINT_MAX: f64 = 40.0;

/// Relative humidity range in %.
pub const HUMIDITY_MIN: f64 = 40.0;
pub const HUMIDITY_MAX: f64 = 85.0;

// --- Documented power-on defaults ---

pub const DEFAULT_TEMPERATURE: f64 = 36.5;
pub const DEFAULT_SETPOINT: f64 = 37.0;
pub const DEFAULT_HUMIDITY: f64 = 65.0;
pub const DEFAULT_AMBIENT_TEMP: f64 = 24.0;
