// incunest: tool server exposing the incubator simulation state

pub mod history;
pub mod mcp;

pub use incunest_shared as shared;
