//! Optional JSON settings file

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{PremError, Result};

/// Settings read from `config.json`
///
/// Every field is optional; environment variables and CLI flags take precedence.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for SettingsFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsFile")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl SettingsFile {
    /// Default location: `<config dir>/prem-mcp/config.json`
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prem-mcp")
            .join("config.json")
    }

    /// Load settings from a specific path
    ///
    /// A missing file yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            PremError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            PremError::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let settings = SettingsFile::load_from_path(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(settings, SettingsFile::default());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"project_id": "proj-9", "base_url": "http://localhost:9000"}"#).unwrap();

        let settings = SettingsFile::load_from_path(&path).unwrap();
        assert!(settings.api_key.is_none());
        assert_eq!(settings.project_id.as_deref(), Some("proj-9"));
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SettingsFile::load_from_path(&path).unwrap_err();
        assert!(matches!(err, PremError::Configuration(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = SettingsFile {
            api_key: Some("sk-secret".to_string()),
            ..SettingsFile::default()
        };
        assert!(!format!("{settings:?}").contains("sk-secret"));
    }

    #[test]
    fn test_default_path() {
        assert!(SettingsFile::default_path().ends_with("prem-mcp/config.json"));
    }
}
