// src/main.rs - tool server entry point
use clap::Parser;
use incunest::mcp::{McpServer, serve_stdio};
use incunest_shared::config::load_or_default;
use std::path::PathBuf;
use std::str::FromStr;

/// IncuNest simulator tool server (JSON-RPC over stdio)
#[derive(Parser, Debug)]
#[command(name = "incunest-mcp", version, about)]
struct Cli {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (overrides [logging] level)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let config = load_or_default(config_path.as_deref());

    let level_name = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let level = tracing::Level::from_str(&level_name).unwrap_or(tracing::Level::INFO);

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = config.map_err(|e| {
        tracing::error!(
            "Failed to load config from '{}': {}",
            config_path.as_deref().unwrap_or("<default>"),
            e
        );
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    tracing::info!("Server: {} v{}", config.server.name, config.server.version);

    let mut server = McpServer::new(config);
    tracing::info!("IncuNest Simulator MCP server running on stdio");
    if let Err(e) = serve_stdio(&mut server).await {
        tracing::error!("Fatal error in server loop: {}", e);
        return Err(e.into());
    }
    Ok(())
}
