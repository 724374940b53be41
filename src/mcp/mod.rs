//! Model Context Protocol server side
//!
//! [`protocol`] holds the JSON-RPC and MCP wire types, [`server`] the stdio
//! loop that dispatches tool calls to the [`crate::tools`] registry.

pub mod protocol;
pub mod server;

pub use server::McpServer;
