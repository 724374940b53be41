//! Error types for prem-mcp

use thiserror::Error;

/// Result type alias using [`PremError`]
pub type Result<T> = std::result::Result<T, PremError>;

/// Main error type for prem-mcp
#[derive(Debug, Error)]
pub enum PremError {
    /// Missing or invalid startup configuration (fatal)
    #[error("{0}")]
    Configuration(String),

    /// Caller input rejected before any remote call
    #[error("{0}")]
    Validation(String),

    /// Tool arguments did not match the tool's input shape
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Non-success status returned by the Prem API
    #[error("Prem API error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// Prem API answered with a body we cannot read
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// MCP transport failure (stdin/stdout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
