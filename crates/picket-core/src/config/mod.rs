//! Configuration management for Picket.
//!
//! Configuration is loaded from a TOML file in the platform config
//! directory. Every field has a default, so a missing or partial file
//! works; only the endpoint URLs must be filled in before a scan.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Picket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder scan settings
    pub scan: ScanConfig,

    /// Size-bound compression settings
    pub compression: CompressionConfig,

    /// Remote service endpoints
    pub endpoints: EndpointsConfig,

    /// Service identity and pass marker
    pub identity: IdentityConfig,

    /// Per-stage time budgets
    pub limits: LimitsConfig,

    /// Retry policy for remote stages
    pub retry: RetryConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.picket.picket/config.toml
    /// - Linux: ~/.config/picket/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\picket\config\config.toml
    ///
    /// Falls back to ~/.picket/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "picket", "picket")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".picket").join("config.toml")
            })
    }

    /// Resolved quarantine folder for the given input folder
    /// (with ~ expansion; defaults to `<input>/quarantine`).
    pub fn quarantine_dir(&self, input: &Path) -> PathBuf {
        match &self.scan.quarantine_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
            None => input.join("quarantine"),
        }
    }

    /// Resolved verdict report path for the given input folder
    /// (with ~ expansion; defaults to `<input>/verdicts.csv`).
    pub fn report_path(&self, input: &Path) -> PathBuf {
        match &self.scan.report_path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
            None => input.join("verdicts.csv"),
        }
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
