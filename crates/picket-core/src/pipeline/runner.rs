//! Per-image stage orchestration.
//!
//! The runner walks one image through compress, credentials, upload,
//! review, quarantine, and cleanup, timing each stage. A failure in one
//! remote stage degrades that stage's output and moves on; only a
//! compress failure ends the task early, since there is nothing left to
//! upload. Every path through here returns a report, never an error.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, LimitsConfig, RetryConfig};
use crate::pipeline::compress::{CompressedFile, Compressor};
use crate::remote::{retry, CredentialBroker, ModerationClient, StorageUploader};
use crate::types::{Credentials, ImageTask, Stage, TaskReport, TimingRecord, Verdict};

/// Runs the full stage sequence for single images.
pub struct TaskRunner {
    compressor: Compressor,
    broker: Arc<dyn CredentialBroker>,
    uploader: Arc<dyn StorageUploader>,
    reviewer: Arc<dyn ModerationClient>,
    quarantine_dir: PathBuf,
    pass_marker: String,
    limits: LimitsConfig,
    retry: RetryConfig,
}

impl TaskRunner {
    pub fn new(
        config: &Config,
        quarantine_dir: PathBuf,
        broker: Arc<dyn CredentialBroker>,
        uploader: Arc<dyn StorageUploader>,
        reviewer: Arc<dyn ModerationClient>,
    ) -> Self {
        Self {
            compressor: Compressor::new(config.compression.clone(), &config.limits),
            broker,
            uploader,
            reviewer,
            quarantine_dir,
            pass_marker: config.identity.pass_marker.clone(),
            limits: config.limits.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Process one image end to end.
    pub async fn process(&self, task: &ImageTask) -> TaskReport {
        let total_start = Instant::now();
        let mut timing = TimingRecord::empty(&task.file_name);

        // Compress. Fatal to the task: an unreadable or undecodable
        // image has nothing to send to the remote stages.
        let stage_start = Instant::now();
        let compressed = self.compressor.shrink(&task.source_path).await;
        timing.compress_secs = stage_start.elapsed().as_secs_f64();

        let compressed = match compressed {
            Ok(compressed) => compressed,
            Err(e) => {
                tracing::error!(file = %task.file_name, error = %e, "compress stage failed, skipping remote stages");
                timing.total_secs = total_start.elapsed().as_secs_f64();
                return TaskReport {
                    verdict: Verdict {
                        file_name: task.file_name.clone(),
                        review_message: None,
                    },
                    timing,
                    quarantined: false,
                };
            }
        };
        tracing::debug!(file = %task.file_name, stage = %Stage::Compress, secs = timing.compress_secs, "stage finished");

        // Credentials. On failure the upload goes out with empty fields
        // and the storage service gets to reject it.
        let stage_start = Instant::now();
        let credentials = match retry::call_stage(
            Stage::Credentials,
            self.limits.credentials_timeout_ms,
            &self.retry,
            || self.broker.issue(&task.file_name),
        )
        .await
        {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::warn!(file = %task.file_name, error = %e, "credential stage failed, continuing with empty token");
                Credentials::empty()
            }
        };
        timing.credentials_secs = stage_start.elapsed().as_secs_f64();
        tracing::debug!(file = %task.file_name, stage = %Stage::Credentials, secs = timing.credentials_secs, "stage finished");

        // Upload. On failure the review is attempted with a blank URL.
        let stage_start = Instant::now();
        let public_url = match retry::call_stage(
            Stage::Upload,
            self.limits.upload_timeout_ms,
            &self.retry,
            || self.uploader.upload(&credentials, &compressed.path),
        )
        .await
        {
            Ok(result) => result.public_url,
            Err(e) => {
                tracing::warn!(file = %task.file_name, error = %e, "upload stage failed, continuing with blank url");
                String::new()
            }
        };
        timing.upload_secs = stage_start.elapsed().as_secs_f64();
        tracing::debug!(file = %task.file_name, stage = %Stage::Upload, secs = timing.upload_secs, "stage finished");

        // Review. On failure the verdict stays unset and the image is
        // reported without a quarantine decision.
        let stage_start = Instant::now();
        let review_message = match retry::call_stage(
            Stage::Review,
            self.limits.review_timeout_ms,
            &self.retry,
            || self.reviewer.review(&public_url),
        )
        .await
        {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(file = %task.file_name, error = %e, "review stage failed, leaving verdict unset");
                None
            }
        };
        timing.review_secs = stage_start.elapsed().as_secs_f64();
        tracing::debug!(file = %task.file_name, stage = %Stage::Review, secs = timing.review_secs, "stage finished");

        let verdict = Verdict {
            file_name: task.file_name.clone(),
            review_message,
        };

        // Quarantine copies the original file, before any re-encoding,
        // so the evidence keeps full fidelity.
        let stage_start = Instant::now();
        let mut quarantined = false;
        if verdict.requires_quarantine(&self.pass_marker) {
            let target = self.quarantine_dir.join(&task.file_name);
            match tokio::fs::copy(&task.source_path, &target).await {
                Ok(_) => {
                    tracing::debug!(file = %task.file_name, target = %target.display(), "copied flagged image to quarantine");
                    quarantined = true;
                }
                Err(e) => {
                    tracing::error!(file = %task.file_name, error = %e, "quarantine copy failed");
                }
            }
        }
        timing.quarantine_secs = stage_start.elapsed().as_secs_f64();
        tracing::debug!(file = %task.file_name, stage = %Stage::Quarantine, secs = timing.quarantine_secs, "stage finished");

        self.cleanup(&compressed).await;

        timing.total_secs = total_start.elapsed().as_secs_f64();
        tracing::debug!(
            file = %task.file_name,
            total_secs = timing.total_secs,
            quarantined,
            "task finished"
        );

        TaskReport {
            verdict,
            timing,
            quarantined,
        }
    }

    /// Remove the derived temp artifact, if the compress stage made one.
    async fn cleanup(&self, compressed: &CompressedFile) {
        if !compressed.derived {
            return;
        }
        match tokio::fs::remove_file(&compressed.path).await {
            Ok(()) => {
                tracing::debug!(path = %compressed.path.display(), stage = %Stage::Cleanup, "removed derived temp file");
            }
            Err(e) => {
                tracing::warn!(path = %compressed.path.display(), error = %e, "failed to remove derived temp file");
            }
        }
    }
}
