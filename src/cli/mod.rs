//! CLI argument parsing

use std::path::PathBuf;

use clap::Parser;

/// MCP server exposing Prem AI chat, RAG and document upload over stdio
#[derive(Debug, Parser)]
#[command(name = "prem-mcp")]
#[command(about = "Prem AI MCP server (stdio transport)", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Prem API key
    #[arg(long, env = "PREM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Prem project id used for chat requests
    #[arg(long, env = "PREM_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Prem API base URL
    #[arg(long, env = "PREM_BASE_URL")]
    pub base_url: Option<String>,

    /// Path to a JSON settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse CLI arguments from environment
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter used when `RUST_LOG` is not set
    #[must_use]
    pub const fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "prem_mcp=debug"
        } else {
            "prem_mcp=info"
        }
    }
}
