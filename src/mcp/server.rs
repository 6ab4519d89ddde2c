//! Request dispatch for the tool server.

use chrono::Utc;
use incunest_shared::Config;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};

use super::protocol::{
    CallToolParams, CallToolResult, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR,
};
use super::state::ToolServerState;
use super::tools::{ToolError, ToolRequest, tool_descriptors};
use crate::history::synthesize_history;

/// Protocol revisions this server can speak.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Owns the server state and answers one message at a time.
pub struct McpServer {
    config: Config,
    state: ToolServerState,
    rng: StdRng,
}

impl McpServer {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_rng(config: Config, rng: StdRng) -> Self {
        let state = ToolServerState::new(&config.simulation);
        Self { config, state, rng }
    }

    pub fn state(&self) -> &ToolServerState {
        &self.state
    }

    /// Handle one raw line. Returns the response to write back, if any.
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        // Replies from the client to server-initiated requests; none are issued.
        let is_reply = value.get("result").is_some() || value.get("error").is_some();
        if value.get("method").is_none() && is_reply {
            tracing::debug!("Ignoring client response: {}", value);
            return None;
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Invalid request: {}", e);
                return Some(JsonRpcResponse::failure(
                    id,
                    INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                ));
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Unsupported jsonrpc version '{}'", request.jsonrpc),
            ));
        }
        self.handle_request(request)
    }

    pub fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Request: method={}, id={:?}", request.method, request.id);
        let Some(id) = request.id.clone() else {
            if !request.method.starts_with("notifications/") {
                tracing::debug!("Dropping notification for unknown method '{}'", request.method);
            }
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize(request.params.as_ref())),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                json!({ "tools": tool_descriptors(self.config.history.default_duration_secs) }),
            ),
            "tools/call" => match request.params.map(serde_json::from_value::<CallToolParams>) {
                Some(Ok(params)) => {
                    let result = self.call_tool(&params.name, params.arguments.as_ref());
                    match serde_json::to_value(result) {
                        Ok(value) => JsonRpcResponse::success(id, value),
                        Err(e) => JsonRpcResponse::failure(
                            id,
                            INTERNAL_ERROR,
                            format!("Failed to encode tool result: {e}"),
                        ),
                    }
                }
                Some(Err(e)) => {
                    JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {e}"))
                }
                None => JsonRpcResponse::failure(
                    id,
                    INVALID_PARAMS,
                    "Invalid params: missing tool name",
                ),
            },
            other => {
                JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };
        Some(response)
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str);
        let protocol_version = match requested {
            Some(v) if SUPPORTED_PROTOCOL_VERSIONS.contains(&v) => v.to_string(),
            _ => self.config.server.protocol_version.clone(),
        };
        tracing::info!("Client initialized (protocol {})", protocol_version);
        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.config.server.name,
                "version": self.config.server.version,
            }
        })
    }

    /// Validate and run a tool. Failures become an `isError` result.
    pub fn call_tool(&mut self, name: &str, arguments: Option<&Value>) -> CallToolResult {
        match ToolRequest::parse(name, arguments).and_then(|request| self.execute(request)) {
            Ok(text) => CallToolResult::text(text),
            Err(e) => {
                tracing::warn!("Tool '{}' failed: {}", name, e);
                CallToolResult::error(e)
            }
        }
    }

    fn execute(&mut self, request: ToolRequest) -> Result<String, ToolError> {
        tracing::debug!("Executing tool {}", request.name());
        match request {
            ToolRequest::GetSimulationState => {
                Ok(serde_json::to_string_pretty(&self.state.snapshot())?)
            }
            ToolRequest::SetTemperatureSetpoint { temperature } => {
                self.state.set_setpoint(temperature);
                tracing::info!("Setpoint set to {}°C", temperature);
                Ok(format!("Temperature setpoint updated to {temperature}°C"))
            }
            ToolRequest::ControlHeater { on } => {
                self.state.set_heater(on);
                Ok(format!("Heater turned {}", on_off(on)))
            }
            ToolRequest::ControlFan { on } => {
                self.state.set_fan(on);
                Ok(format!("Fan turned {}", on_off(on)))
            }
            ToolRequest::GetSensorHistory { duration } => {
                let duration = duration.unwrap_or(self.config.history.default_duration_secs);
                let history =
                    synthesize_history(duration, &self.config.history, Utc::now(), &mut self.rng)
                        .ok_or(ToolError::InvalidDuration)?;
                Ok(serde_json::to_string_pretty(&history)?)
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}
