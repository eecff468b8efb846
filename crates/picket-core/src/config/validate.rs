//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.workers == 0 {
            return Err(ConfigError::ValidationError(
                "scan.workers must be > 0".into(),
            ));
        }
        if self.scan.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "scan.extensions must not be empty".into(),
            ));
        }
        if self.compression.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "compression.max_bytes must be > 0".into(),
            ));
        }
        if self.compression.start_quality == 0 || self.compression.start_quality > 100 {
            return Err(ConfigError::ValidationError(
                "compression.start_quality must be between 1 and 100".into(),
            ));
        }
        if self.compression.min_quality == 0 || self.compression.min_quality > 100 {
            return Err(ConfigError::ValidationError(
                "compression.min_quality must be between 1 and 100".into(),
            ));
        }
        if self.compression.min_quality > self.compression.start_quality {
            return Err(ConfigError::ValidationError(
                "compression.min_quality must not exceed compression.start_quality".into(),
            ));
        }
        if self.identity.pass_marker.is_empty() {
            return Err(ConfigError::ValidationError(
                "identity.pass_marker must not be empty".into(),
            ));
        }
        if self.limits.compress_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.compress_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.credentials_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.credentials_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.upload_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.upload_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.review_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.review_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
