// End-to-end tests for the tool server over an in-memory pipe

use chrono::{DateTime, Utc};
use incunest::mcp::{McpServer, serve};
use incunest::shared::Config;
use incunest::shared::config::load_config;
use serde_json::{Value, json};
use std::io::Write;
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

struct Client {
    writer: WriteHalf<DuplexStream>,
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    next_id: u64,
}

impl Client {
    async fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let msg = json!({"jsonrpc": "2.0", "id": self.next_id, "method": method, "params": params});
        self.send(msg).await;
        let line = self.lines.next_line().await.unwrap().expect("response line");
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response["id"], self.next_id);
        response
    }

    async fn send(&mut self, msg: Value) {
        let mut line = msg.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Value {
        let params = json!({"name": name, "arguments": arguments});
        let response = self.request("tools/call", params).await;
        assert!(response.get("error").is_none(), "unexpected protocol error: {response}");
        response["result"].clone()
    }
}

fn start() -> (Client, tokio::task::JoinHandle<()>) {
    start_with(Config::default())
}

fn start_with(config: Config) -> (Client, tokio::task::JoinHandle<()>) {
    let (client_end, server_end) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    let handle = tokio::spawn(async move {
        let mut server = McpServer::new(config);
        serve(&mut server, BufReader::new(server_read), server_write).await.unwrap();
    });
    let (client_read, client_write) = tokio::io::split(client_end);
    let client = Client {
        writer: client_write,
        lines: BufReader::new(client_read).lines(),
        next_id: 0,
    };
    (client, handle)
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn full_session() {
    let (mut client, handle) = start();

    let init = client
        .request(
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0"}
            }),
        )
        .await;
    assert_eq!(init["result"]["serverInfo"]["name"], "incunest-sim-server");
    client
        .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;

    let list = client.request("tools/list", json!({})).await;
    assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 5);

    let state = client.call_tool("get_simulation_state", json!({})).await;
    let snapshot: Value = serde_json::from_str(text(&state)).unwrap();
    assert_eq!(snapshot["setpoint"], 37.0);
    assert_eq!(snapshot["fanOn"], true);

    let set = client.call_tool("set_temperature_setpoint", json!({"temperature": 34})).await;
    assert_eq!(text(&set), "Temperature setpoint updated to 34°C");

    let fan = client.call_tool("control_fan", json!({"state": false})).await;
    assert_eq!(text(&fan), "Fan turned OFF");

    let state = client.call_tool("get_simulation_state", json!({})).await;
    let snapshot: Value = serde_json::from_str(text(&state)).unwrap();
    assert_eq!(snapshot["setpoint"], 34.0);
    assert_eq!(snapshot["fanOn"], false);

    drop(client);
    handle.await.unwrap();
}

#[tokio::test]
async fn rejected_setpoint_is_an_error_result_and_changes_nothing() {
    let (mut client, _handle) = start();

    let result = client.call_tool("set_temperature_setpoint", json!({"temperature": 50})).await;
    assert_eq!(result["isError"], true);
    assert_eq!(text(&result), "Error: Temperature must be between 30 and 40°C");

    let result = client.call_tool("control_heater", json!({"state": "yes"})).await;
    assert_eq!(result["isError"], true);
    assert_eq!(text(&result), "Error: Invalid state value");

    let state = client.call_tool("get_simulation_state", json!({})).await;
    let snapshot: Value = serde_json::from_str(text(&state)).unwrap();
    assert_eq!(snapshot["setpoint"], 37.0);
    assert_eq!(snapshot["heaterOn"], true);
}

#[tokio::test]
async fn sensor_history_defaults_to_an_hour_in_ten_steps() {
    let (mut client, _handle) = start();

    let result = client.call_tool("get_sensor_history", json!({})).await;
    assert!(result.get("isError").is_none());
    let history: Vec<Value> = serde_json::from_str(text(&result)).unwrap();
    assert_eq!(history.len(), 10);

    let stamps: Vec<DateTime<Utc>> = history
        .iter()
        .map(|s| s["timestamp"].as_str().unwrap().parse().unwrap())
        .collect();
    for pair in stamps.windows(2) {
        assert!(pair[0] > pair[1]);
        assert_eq!((pair[0] - pair[1]).num_seconds(), 360);
    }
    for sample in &history {
        let t = sample["temperature"].as_f64().unwrap();
        let h = sample["humidity"].as_f64().unwrap();
        assert!((36.5..37.5).contains(&t));
        assert!((65.0..70.0).contains(&h));
    }

    let result = client.call_tool("get_sensor_history", json!({"duration": 100})).await;
    let history: Vec<Value> = serde_json::from_str(text(&result)).unwrap();
    assert_eq!(history.len(), 10);
}

#[tokio::test]
async fn protocol_errors_keep_the_session_alive() {
    let (mut client, _handle) = start();

    let response = client.request("does/not/exist", json!({})).await;
    assert_eq!(response["error"]["code"], -32601);

    let response = client.request("ping", json!({})).await;
    assert_eq!(response["result"], json!({}));
}

#[tokio::test]
async fn config_file_shapes_server_identity_and_history() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[server]\nname = \"ward-3-sim\"\n\n[history]\nsamples = 4\ndefault_duration_secs = 120.0"
    )
    .unwrap();
    file.flush().unwrap();
    let config = load_config(file.path().to_str().unwrap()).unwrap();
    let (mut client, _handle) = start_with(config);

    let init = client.request("initialize", json!({"protocolVersion": "2024-11-05"})).await;
    assert_eq!(init["result"]["serverInfo"]["name"], "ward-3-sim");

    let result = client.call_tool("get_sensor_history", json!({})).await;
    let history: Vec<Value> = serde_json::from_str(text(&result)).unwrap();
    assert_eq!(history.len(), 4);
    let first: DateTime<Utc> = history[0]["timestamp"].as_str().unwrap().parse().unwrap();
    let second: DateTime<Utc> = history[1]["timestamp"].as_str().unwrap().parse().unwrap();
    assert_eq!((first - second).num_seconds(), 30);
}

#[tokio::test]
async fn malformed_bytes_do_not_end_the_session() {
    let (mut client, _handle) = start();

    let response = client.request("ping", json!({})).await;
    assert_eq!(response["result"], json!({}));

    client.writer.write_all(b"\xff\xfe garbage\n").await.unwrap();
    let line = client.lines.next_line().await.unwrap().expect("parse error line");
    let parse_error: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parse_error["id"], Value::Null);
    assert_eq!(parse_error["error"]["code"], -32700);

    let response = client.request("ping", json!({})).await;
    assert_eq!(response["result"], json!({}));
}
