//! Line-delimited transport: one JSON-RPC message per line in each direction.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use super::server::McpServer;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
///
/// Lines are decoded lossily, so bytes that are not UTF-8 end up as a parse
/// error response instead of closing the session.
pub async fn serve<R, W>(
    server: &mut McpServer,
    mut reader: R,
    mut writer: W,
) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let raw = String::from_utf8_lossy(&buf);
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        tracing::trace!("RX: {}", line);

        if let Some(response) = server.handle_line(line) {
            let mut out = serde_json::to_string(&response)?;
            tracing::trace!("TX: {}", out);
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }
    }
    tracing::info!("Input closed, shutting down");
    Ok(())
}

/// Serve over the process's stdin/stdout.
pub async fn serve_stdio(server: &mut McpServer) -> Result<(), ServerError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(server, stdin, stdout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::PARSE_ERROR;
    use incunest_shared::Config;
    use serde_json::Value;

    #[tokio::test]
    async fn answers_each_request_on_its_own_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let mut server = McpServer::new(Config::default());
        let mut output = Vec::new();
        serve(&mut server, input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], 2);
        assert_eq!(lines[1]["result"]["tools"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn writes_exact_wire_format() {
        let reader = tokio_test::io::Builder::new()
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n")
            .build();
        let writer = tokio_test::io::Builder::new()
            .write(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{}}\n")
            .build();
        let mut server = McpServer::new(Config::default());
        serve(&mut server, BufReader::new(reader), writer).await.unwrap();
    }

    #[tokio::test]
    async fn non_utf8_line_gets_parse_error_and_session_continues() {
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.extend_from_slice(b"\n");
        let mut server = McpServer::new(Config::default());
        let mut output = Vec::new();
        serve(&mut server, &input[..], &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["id"], Value::Null);
        assert_eq!(lines[1]["error"]["code"], PARSE_ERROR);
        assert_eq!(lines[2]["id"], 2);
        assert_eq!(lines[2]["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn last_line_without_newline_is_served() {
        let input = br#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#;
        let mut server = McpServer::new(Config::default());
        let mut output = Vec::new();
        serve(&mut server, &input[..], &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "{\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{}}\n");
    }

    #[tokio::test]
    async fn empty_input_ends_cleanly() {
        let mut server = McpServer::new(Config::default());
        let mut output = Vec::new();
        serve(&mut server, &b""[..], &mut output).await.unwrap();
        assert!(output.is_empty());
    }
}
