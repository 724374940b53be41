//! prem-mcp: Prem AI tools over the Model Context Protocol
//!
//! This library exposes Prem AI chat completions, RAG over document
//! repositories and document upload as MCP tools served on stdin/stdout.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod messages;
pub mod requests;
pub mod services;
pub mod tools;

// Re-exports for convenience
pub use error::{PremError, Result};
