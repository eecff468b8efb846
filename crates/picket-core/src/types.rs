//! Core data types for the Picket moderation pipeline.
//!
//! These types flow between the pipeline stages and out to the reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One image queued for processing.
///
/// Created while enumerating the input folder and dropped when its task
/// completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTask {
    /// Absolute path to the source file
    pub source_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,
}

impl ImageTask {
    /// Build a task from a source path. Paths without a final component
    /// (e.g. `/`) yield an empty file name; discovery never produces those.
    pub fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            source_path: path,
            file_name,
        }
    }
}

/// Single-use upload credentials issued per task.
///
/// Owned exclusively by the upload call that consumes them; never reused
/// across tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Authorization token for the storage provider
    pub token: String,

    /// Destination object name in storage
    pub resource_key: String,
}

impl Credentials {
    /// The no-credentials sentinel a failed broker call degrades to.
    /// Uploads still run with it and are expected to fail gracefully.
    pub fn empty() -> Self {
        Self {
            token: String::new(),
            resource_key: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty() && self.resource_key.is_empty()
    }
}

/// Result of a storage upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    /// Publicly reachable URL of the uploaded object, plain-scheme
    pub public_url: String,
}

/// The moderation outcome for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// File name the verdict belongs to
    pub file_name: String,

    /// Free-text judgment from the review service. `None` means no verdict
    /// could be obtained (upstream failure or explicit null from the
    /// service), which is distinct from a negative verdict.
    pub review_message: Option<String>,
}

impl Verdict {
    /// Whether this verdict routes the image to quarantine: a message is
    /// present and does not contain the pass marker. An absent message
    /// never quarantines (upstream failure is not a moderation failure).
    pub fn requires_quarantine(&self, pass_marker: &str) -> bool {
        match &self.review_message {
            Some(message) => !message.contains(pass_marker),
            None => false,
        }
    }
}

/// Wall-clock seconds spent in each stage of one task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingRecord {
    /// File name the timings belong to
    pub file_name: String,

    /// Compress stage (includes the skip-if-small check)
    pub compress_secs: f64,

    /// Credential fetch stage
    pub credentials_secs: f64,

    /// Storage upload stage
    pub upload_secs: f64,

    /// Moderation review stage
    pub review_secs: f64,

    /// Quarantine check (and copy, when it runs)
    pub quarantine_secs: f64,

    /// Whole task, wall-clock
    pub total_secs: f64,
}

impl TimingRecord {
    /// A zeroed record for tasks that never ran (e.g. a panicked worker).
    pub fn empty(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }
}

/// Everything one task invocation returns to the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub verdict: Verdict,
    pub timing: TimingRecord,

    /// Whether the quarantine copy ran for this task
    pub quarantined: bool,
}

/// Summary counters for a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Images dispatched
    pub total: usize,

    /// Images copied to quarantine
    pub flagged: usize,

    /// Images with no obtainable verdict
    pub failed: usize,

    /// Whole run, wall-clock seconds
    pub total_seconds: f64,
}

/// Pipeline stage names, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compress,
    Credentials,
    Upload,
    Review,
    Quarantine,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Compress => "compress",
            Stage::Credentials => "credentials",
            Stage::Upload => "upload",
            Stage::Review => "review",
            Stage::Quarantine => "quarantine",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_path_extracts_file_name() {
        let task = ImageTask::from_path(PathBuf::from("/photos/batch/shot_01.PNG"));
        assert_eq!(task.file_name, "shot_01.PNG");
        assert_eq!(task.source_path, PathBuf::from("/photos/batch/shot_01.PNG"));
    }

    #[test]
    fn test_empty_credentials_sentinel() {
        let creds = Credentials::empty();
        assert!(creds.is_empty());
        assert!(!Credentials {
            token: "tok".into(),
            resource_key: String::new(),
        }
        .is_empty());
    }

    #[test]
    fn test_quarantine_rule_absent_message_passes() {
        let verdict = Verdict {
            file_name: "a.png".into(),
            review_message: None,
        };
        assert!(!verdict.requires_quarantine("正常"));
    }

    #[test]
    fn test_quarantine_rule_pass_marker_anywhere_passes() {
        let verdict = Verdict {
            file_name: "a.png".into(),
            review_message: Some("机审结果: 正常".into()),
        };
        assert!(!verdict.requires_quarantine("正常"));
    }

    #[test]
    fn test_quarantine_rule_missing_marker_flags() {
        let verdict = Verdict {
            file_name: "a.png".into(),
            review_message: Some("涉嫌违规".into()),
        };
        assert!(verdict.requires_quarantine("正常"));
    }

    #[test]
    fn test_quarantine_rule_empty_message_flags() {
        // An empty-but-present message lacks the marker, so it flags.
        let verdict = Verdict {
            file_name: "a.png".into(),
            review_message: Some(String::new()),
        };
        assert!(verdict.requires_quarantine("正常"));
    }

    #[test]
    fn test_stage_display_names() {
        assert_eq!(Stage::Compress.to_string(), "compress");
        assert_eq!(Stage::Credentials.to_string(), "credentials");
        assert_eq!(Stage::Review.to_string(), "review");
    }
}
