//! Configuration management for prem-mcp
//!
//! Values are resolved in order of increasing priority:
//! 1. Settings file (`<config dir>/prem-mcp/config.json` or `--config`)
//! 2. Environment variables (`PREM_API_KEY`, `PREM_PROJECT_ID`, `PREM_BASE_URL`)
//! 3. CLI flags
//!
//! Environment variables and CLI flags arrive already merged through clap.

pub mod settings;

pub use self::settings::SettingsFile;
use crate::{
    cli::Cli,
    error::{PremError, Result},
};

/// Prem API base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://app.premai.io";

/// Resolved runtime configuration
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// API key sent as a bearer token on every request
    pub api_key: String,

    /// Project that scopes chat requests
    pub project_id: String,

    /// Base URL of the Prem API
    pub base_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Config {
    /// Load configuration for the parsed command line
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings file is unreadable or the
    /// API key or project id is missing
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = cli.config.clone().unwrap_or_else(SettingsFile::default_path);
        let file = SettingsFile::load_from_path(&path)?;
        Self::resolve(cli, file)
    }

    /// Merge CLI/environment values over settings-file values
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key or project id is missing
    pub fn resolve(cli: &Cli, file: SettingsFile) -> Result<Self> {
        let api_key = pick(cli.api_key.clone(), file.api_key).ok_or_else(|| {
            PremError::Configuration("PREM_API_KEY environment variable is required".to_string())
        })?;

        let project_id = pick(cli.project_id.clone(), file.project_id).ok_or_else(|| {
            PremError::Configuration("PREM_PROJECT_ID environment variable is required".to_string())
        })?;

        let base_url = pick(cli.base_url.clone(), file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            api_key,
            project_id,
            base_url,
        })
    }
}

/// First non-blank value, preferring `primary`
fn pick(primary: Option<String>, fallback: Option<String>) -> Option<String> {
    primary
        .filter(|v| !v.trim().is_empty())
        .or_else(|| fallback.filter(|v| !v.trim().is_empty()))
}
