//! Error types for the Picket moderation pipeline.
//!
//! Errors come in two layers: `PicketError` for failures that abort the
//! whole run (bad config, unreadable input folder, report write failure),
//! and `StageError` for failures confined to a single stage of a single
//! task. Stage errors never abort the run; the task runner converts them
//! into the degraded value the next stage expects.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Stage;

/// Top-level error type for run-fatal failures.
#[derive(Error, Debug)]
pub enum PicketError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input folder cannot be enumerated
    #[error("Cannot read input folder {path}: {message}")]
    InputDir { path: PathBuf, message: String },

    /// Quarantine or report directory cannot be created
    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report file cannot be written
    #[error("Cannot write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures confined to one stage of one task.
///
/// The `stage` field names the pipeline stage for logs and retry
/// classification; `status_code` is populated when the remote side
/// answered with a non-success HTTP status.
#[derive(Error, Debug)]
pub enum StageError {
    /// Network or HTTP failure talking to a remote service
    #[error("{stage} request failed: {message}")]
    Transport {
        stage: Stage,
        message: String,
        status_code: Option<u16>,
    },

    /// Response arrived but lacked the expected shape
    #[error("{stage} response malformed: {message}")]
    ResponseShape { stage: Stage, message: String },

    /// Stage exceeded its configured time budget
    #[error("{stage} timed out after {timeout_ms}ms")]
    Timeout { stage: Stage, timeout_ms: u64 },

    /// Source image cannot be read or decoded (fatal to its task)
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Local create/copy/delete/write failure
    #[error("{stage} filesystem failure on {path}: {message}")]
    Filesystem {
        stage: Stage,
        path: PathBuf,
        message: String,
    },
}

/// Convenience type alias for Picket results.
pub type Result<T> = std::result::Result<T, PicketError>;

/// Convenience type alias for stage-local results.
pub type StageResult<T> = std::result::Result<T, StageError>;
