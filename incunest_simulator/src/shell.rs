//! Headless visualization shell.
//!
//! Keeps the per-frame contract of the 3D front-end without rendering: each
//! frame advances the door animation and the engine, spins the fan, and
//! produces the readouts. User actions are routed into the engine.

use std::fmt;
use std::str::FromStr;

use incunest_shared::{SimulationData, SimulationEngine, WokwiUpdate};

use crate::readout::Readouts;

pub const TOGGLE_DOOR: &str = "toggle-door";
pub const TOGGLE_HEATER: &str = "toggle-heater";
pub const TOGGLE_FAN: &str = "toggle-fan";
pub const RESET_SIM: &str = "reset-sim";

/// Fan blade rotation per frame while the fan runs, in radians.
pub const FAN_BLADE_STEP: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    ToggleDoor,
    ToggleHeater,
    ToggleFan,
    Reset,
    SetSetpoint(f64),
}

impl FromStr for UserAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(value) = s.strip_prefix("setpoint=") {
            return value
                .parse::<f64>()
                .map(UserAction::SetSetpoint)
                .map_err(|e| format!("Invalid setpoint '{value}': {e}"));
        }
        match s {
            TOGGLE_DOOR => Ok(UserAction::ToggleDoor),
            TOGGLE_HEATER => Ok(UserAction::ToggleHeater),
            TOGGLE_FAN => Ok(UserAction::ToggleFan),
            RESET_SIM => Ok(UserAction::Reset),
            other => Err(format!("Unknown action '{other}'")),
        }
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAction::ToggleDoor => f.write_str(TOGGLE_DOOR),
            UserAction::ToggleHeater => f.write_str(TOGGLE_HEATER),
            UserAction::ToggleFan => f.write_str(TOGGLE_FAN),
            UserAction::Reset => f.write_str(RESET_SIM),
            UserAction::SetSetpoint(t) => write!(f, "setpoint={t}"),
        }
    }
}

/// Sliding front door. Eases a fixed fraction of the remaining distance per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DoorAnimator {
    pub position_z: f64,
    target_z: f64,
}

impl DoorAnimator {
    pub const CLOSED_Z: f64 = 2.55;
    pub const OPEN_Z: f64 = 3.5;
    const EASE: f64 = 0.1;
    const SNAP: f64 = 0.01;

    pub fn new() -> Self {
        Self {
            position_z: Self::CLOSED_Z,
            target_z: Self::CLOSED_Z,
        }
    }

    /// Retarget to the opposite end; works mid-animation too.
    pub fn toggle(&mut self) {
        self.target_z = if self.target_z == Self::OPEN_Z {
            Self::CLOSED_Z
        } else {
            Self::OPEN_Z
        };
    }

    pub fn tick(&mut self) {
        let diff = self.target_z - self.position_z;
        if diff.abs() > Self::SNAP {
            self.position_z += diff * Self::EASE;
        } else {
            self.position_z = self.target_z;
        }
    }

    pub fn is_open(&self) -> bool {
        self.target_z == Self::OPEN_Z
    }

    pub fn is_moving(&self) -> bool {
        self.position_z != self.target_z
    }
}

impl Default for DoorAnimator {
    fn default() -> Self {
        Self::new()
    }
}

pub struct VisualizationShell {
    engine: SimulationEngine,
    door: DoorAnimator,
    fan_blade_angle: f64,
    frames: u64,
}

impl VisualizationShell {
    pub fn new(engine: SimulationEngine) -> Self {
        Self {
            engine,
            door: DoorAnimator::new(),
            fan_blade_angle: 0.0,
            frames: 0,
        }
    }

    /// One animation frame.
    pub fn frame(&mut self) -> Readouts {
        self.door.tick();
        if self.engine.data().fan_on {
            self.fan_blade_angle = (self.fan_blade_angle + FAN_BLADE_STEP) % std::f64::consts::TAU;
        }
        self.engine.update();
        self.frames += 1;
        Readouts::from(&self.engine.data())
    }

    pub fn apply(&mut self, action: &UserAction) {
        tracing::info!("User action: {}", action);
        match action {
            UserAction::ToggleDoor => self.door.toggle(),
            UserAction::ToggleHeater => self.engine.toggle_heater(),
            UserAction::ToggleFan => self.engine.toggle_fan(),
            UserAction::Reset => self.engine.reset(),
            UserAction::SetSetpoint(t) => self.engine.set_temperature_setpoint(*t),
        }
    }

    pub fn apply_wokwi(&mut self, update: &WokwiUpdate) {
        self.engine.set_from_wokwi(update);
    }

    pub fn data(&self) -> SimulationData {
        self.engine.data()
    }

    pub fn door(&self) -> &DoorAnimator {
        &self.door
    }

    pub fn fan_blade_angle(&self) -> f64 {
        self.fan_blade_angle
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
