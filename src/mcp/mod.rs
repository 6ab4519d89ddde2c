//! Tool server speaking newline-delimited JSON-RPC over stdio.

pub mod protocol;
pub mod server;
pub mod state;
pub mod tools;
pub mod transport;

pub use server::McpServer;
pub use state::{ToolServerState, ToolStateSnapshot};
pub use tools::{ToolError, ToolRequest};
pub use transport::{ServerError, serve, serve_stdio};
