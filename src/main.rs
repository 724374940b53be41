//! prem-mcp binary entry point

use std::sync::Arc;

use color_eyre::Result;
use prem_mcp::{
    cli::Cli,
    config::Config,
    mcp::McpServer,
    services::PremClient,
    tools::{ToolContext, ToolRegistry},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Install error handler
    color_eyre::install()?;

    // Environment from .env must be in place before clap reads it
    let _ = dotenv::dotenv();

    let cli = Cli::parse_args();

    // stdout carries the protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load(&cli).inspect_err(|e| tracing::error!("configuration error: {e}"))?;
    let client = PremClient::new(&config)?;
    tracing::info!(base_url = client.base_url(), project_id = %config.project_id, "server initialized");

    let context = ToolContext::new(Arc::new(client), config.project_id.clone());
    let server = McpServer::new(ToolRegistry::with_prem_tools(), context);

    server
        .run_stdio()
        .await
        .inspect_err(|e| tracing::error!("fatal server error: {e}"))?;

    Ok(())
}
