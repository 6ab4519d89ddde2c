//! Tool catalogue and typed tool requests.
//!
//! Arguments are decoded into a [`ToolRequest`] and fully validated before the
//! server touches its state, so a rejected call never mutates anything.

use incunest_shared::{SETPOINT_MAX, SETPOINT_MIN};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

pub const GET_SIMULATION_STATE: &str = "get_simulation_state";
pub const SET_TEMPERATURE_SETPOINT: &str = "set_temperature_setpoint";
pub const CONTROL_HEATER: &str = "control_heater";
pub const CONTROL_FAN: &str = "control_fan";
pub const GET_SENSOR_HISTORY: &str = "get_sensor_history";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Invalid temperature value")]
    InvalidTemperature,
    #[error("Temperature must be between 30 and 40°C")]
    TemperatureOutOfRange,
    #[error("Invalid state value")]
    InvalidState,
    #[error("Invalid duration value")]
    InvalidDuration,
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Failed to encode result: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Encode(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    GetSimulationState,
    SetTemperatureSetpoint { temperature: f64 },
    ControlHeater { on: bool },
    ControlFan { on: bool },
    /// `None` means the configured default duration.
    GetSensorHistory { duration: Option<f64> },
}

#[derive(Deserialize)]
struct SetpointArgs {
    temperature: f64,
}

#[derive(Deserialize)]
struct SwitchArgs {
    state: bool,
}

#[derive(Default, Deserialize)]
struct HistoryArgs {
    #[serde(default)]
    duration: Option<f64>,
}

fn decode<T: DeserializeOwned>(arguments: Option<&Value>) -> Option<T> {
    arguments.and_then(|v| serde_json::from_value(v.clone()).ok())
}

impl ToolRequest {
    pub fn parse(name: &str, arguments: Option<&Value>) -> Result<Self, ToolError> {
        match name {
            GET_SIMULATION_STATE => Ok(Self::GetSimulationState),
            SET_TEMPERATURE_SETPOINT => {
                let args: SetpointArgs = decode(arguments).ok_or(ToolError::InvalidTemperature)?;
                if !(SETPOINT_MIN..=SETPOINT_MAX).contains(&args.temperature) {
                    return Err(ToolError::TemperatureOutOfRange);
                }
                Ok(Self::SetTemperatureSetpoint {
                    temperature: args.temperature,
                })
            }
            CONTROL_HEATER => decode::<SwitchArgs>(arguments)
                .map(|args| Self::ControlHeater { on: args.state })
                .ok_or(ToolError::InvalidState),
            CONTROL_FAN => decode::<SwitchArgs>(arguments)
                .map(|args| Self::ControlFan { on: args.state })
                .ok_or(ToolError::InvalidState),
            GET_SENSOR_HISTORY => {
                let args: HistoryArgs = match arguments {
                    None | Some(Value::Null) => HistoryArgs::default(),
                    Some(_) => decode(arguments).ok_or(ToolError::InvalidDuration)?,
                };
                let duration = match args.duration {
                    None => None,
                    // zero falls back to the default, like an omitted value
                    Some(d) if d == 0.0 => None,
                    Some(d) if d.is_finite() && d > 0.0 => Some(d),
                    Some(_) => return Err(ToolError::InvalidDuration),
                };
                Ok(Self::GetSensorHistory { duration })
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetSimulationState => GET_SIMULATION_STATE,
            Self::SetTemperatureSetpoint { .. } => SET_TEMPERATURE_SETPOINT,
            Self::ControlHeater { .. } => CONTROL_HEATER,
            Self::ControlFan { .. } => CONTROL_FAN,
            Self::GetSensorHistory { .. } => GET_SENSOR_HISTORY,
        }
    }
}

/// Tool descriptors returned by `tools/list`.
pub fn tool_descriptors(default_duration_secs: f64) -> Value {
    json!([
        {
            "name": GET_SIMULATION_STATE,
            "description": "Get current state of the incubator simulation",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "required": []
            }
        },
        {
            "name": SET_TEMPERATURE_SETPOINT,
            "description": "Set the target temperature for the incubator",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "temperature": {
                        "type": "number",
                        "description": "Target temperature in Celsius (30-40)",
                        "minimum": SETPOINT_MIN,
                        "maximum": SETPOINT_MAX
                    }
                },
                "required": ["temperature"]
            }
        },
        {
            "name": CONTROL_HEATER,
            "description": "Turn heater on or off",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "state": {
                        "type": "boolean",
                        "description": "true to turn on, false to turn off"
                    }
                },
                "required": ["state"]
            }
        },
        {
            "name": CONTROL_FAN,
            "description": "Turn fan on or off",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "state": {
                        "type": "boolean",
                        "description": "true to turn on, false to turn off"
                    }
                },
                "required": ["state"]
            }
        },
        {
            "name": GET_SENSOR_HISTORY,
            "description": "Get historical sensor data",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "duration": {
                        "type": "number",
                        "description": "Duration in seconds to retrieve",
                        "default": default_duration_secs
                    }
                },
                "required": []
            }
        }
    ])
}
