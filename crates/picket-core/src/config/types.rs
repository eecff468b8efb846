//! Sub-configuration structs with serde defaults.

use serde::{Deserialize, Serialize};

/// Folder scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Worker pool size for concurrent tasks
    pub workers: usize,

    /// Recognized image extensions, matched case-insensitively
    pub extensions: Vec<String>,

    /// Quarantine folder. Unset means `<input>/quarantine`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_dir: Option<String>,

    /// Verdict report path. Unset means `<input>/verdicts.csv`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            quarantine_dir: None,
            report_path: None,
        }
    }
}

/// Size-bound compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Files at or under this many bytes are passed through untouched
    pub max_bytes: u64,

    /// JPEG quality of the first re-encode attempt
    pub start_quality: u8,

    /// Quality floor; the encoder gives up shrinking below this
    pub min_quality: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_bytes: 256 * 1024,
            start_quality: 50,
            min_quality: 10,
        }
    }
}

/// Remote service endpoints.
///
/// These are deployment-specific and default to empty; `picket scan`
/// refuses to run until all three are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Credential-issuing endpoint (POST JSON)
    pub credentials_url: String,

    /// Object-storage upload endpoint (POST multipart)
    pub upload_url: String,

    /// Moderation review endpoint (POST form)
    pub review_url: String,
}

impl EndpointsConfig {
    /// Name of the first unset endpoint field, if any.
    pub fn first_unset(&self) -> Option<&'static str> {
        if self.credentials_url.is_empty() {
            return Some("endpoints.credentials_url");
        }
        if self.upload_url.is_empty() {
            return Some("endpoints.upload_url");
        }
        if self.review_url.is_empty() {
            return Some("endpoints.review_url");
        }
        None
    }
}

/// Identity fields the remote services expect, plus the pass marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Application key sent to the credential endpoint
    pub app_key: String,

    /// Account name sent to the moderation endpoint
    pub account: String,

    /// Package name sent to the moderation endpoint
    pub package_name: String,

    /// Substring whose presence in a verdict means "compliant"
    pub pass_marker: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            app_key: "app-screenshot-review".to_string(),
            account: "servertest".to_string(),
            package_name: "com.eebbk.apps".to_string(),
            pass_marker: "正常".to_string(),
        }
    }
}

/// Per-stage time budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Compression (decode + re-encode) timeout in milliseconds
    pub compress_timeout_ms: u64,

    /// Credential fetch timeout in milliseconds
    pub credentials_timeout_ms: u64,

    /// Upload timeout in milliseconds
    pub upload_timeout_ms: u64,

    /// Moderation review timeout in milliseconds
    pub review_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            compress_timeout_ms: 30_000,
            credentials_timeout_ms: 10_000,
            upload_timeout_ms: 60_000,
            review_timeout_ms: 15_000,
        }
    }
}

/// Retry policy for the remote stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts after the first failure. 0 disables retries.
    pub attempts: u32,

    /// Base backoff delay in milliseconds, doubled per attempt
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_ms: 500,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
