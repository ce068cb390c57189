use std::path::{Path, PathBuf};

use compact_str::ToCompactString;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::result::{ExporterError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// The URL of the GitLab instance
    pub gitlab_url: String,
    /// The Personal Access Token to authenticate with GitLab
    pub gitlab_token: String,
    /// Address the `/metrics` endpoint listens on
    pub listen_address: String,
    /// Seconds to wait after a poll cycle before the next one
    pub poll_interval_secs: u64,
    /// Items requested per page, at most 100
    pub per_page: u32,
    /// Seconds before a single API request times out
    pub request_timeout_secs: u64,
    /// Maximum number of pages fetched per listing
    pub max_pages: Option<u32>,
    /// Log level (trace, debug, info, warn, error or off)
    pub log_level: Option<String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            gitlab_url: String::new(),
            gitlab_token: String::new(),
            listen_address: "0.0.0.0:9168".to_string(),
            poll_interval_secs: 60,
            per_page: 100,
            request_timeout_secs: 30,
            max_pages: Some(1000),
            log_level: None,
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.gitlab_url.trim().is_empty() {
            return Err("gitlab_url is required".to_string());
        }
        if self.gitlab_token.trim().is_empty() {
            return Err("gitlab_token is required".to_string());
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("gitlab-exporter.toml")
    } else {
        PathBuf::from("gitlab-exporter.toml")
    }
}

/// Loads the configuration file, falling back to defaults when it does not exist.
pub fn load_config(config_file: &Path) -> Result<ExporterConfig> {
    if !config_file.exists() {
        return Ok(ExporterConfig::default());
    }

    confy::load_path(config_file).map_err(|e| ExporterError::ConfigError(e.to_compact_string()))
}

pub fn save_config(config_file: &Path, config: &ExporterConfig) -> Result<()> {
    confy::store_path(config_file, config)
        .map_err(|e| ExporterError::ConfigError(e.to_compact_string()))?;

    Ok(())
}
