//! Folder-level orchestration: discover, dispatch, aggregate, report.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{PicketError, Result};
use crate::remote::{
    CredentialBroker, HttpCredentialBroker, HttpModerationClient, HttpStorageUploader,
    ModerationClient, StorageUploader,
};
use crate::report;
use crate::types::{ImageTask, ScanStats, TaskReport, TimingRecord, Verdict};

use super::discovery::FileDiscovery;
use super::runner::TaskRunner;
use super::scheduler::Scheduler;

/// Everything a finished scan hands back to the caller.
#[derive(Debug)]
pub struct ScanOutcome {
    pub stats: ScanStats,
    pub reports: Vec<TaskReport>,
    pub report_path: PathBuf,
    pub timing_path: PathBuf,
    pub quarantine_dir: PathBuf,
}

/// A configured scan over one input folder.
pub struct ScanJob {
    config: Config,
    broker: Arc<dyn CredentialBroker>,
    uploader: Arc<dyn StorageUploader>,
    reviewer: Arc<dyn ModerationClient>,
}

impl ScanJob {
    /// Wire the job against the HTTP services named in the config.
    pub fn new(config: Config) -> Self {
        let broker = Arc::new(HttpCredentialBroker::new(
            &config.endpoints,
            &config.identity,
        ));
        let uploader = Arc::new(HttpStorageUploader::new(&config.endpoints));
        let reviewer = Arc::new(HttpModerationClient::new(
            &config.endpoints,
            &config.identity,
        ));
        Self::with_services(config, broker, uploader, reviewer)
    }

    /// Wire the job against caller-supplied service implementations.
    pub fn with_services(
        config: Config,
        broker: Arc<dyn CredentialBroker>,
        uploader: Arc<dyn StorageUploader>,
        reviewer: Arc<dyn ModerationClient>,
    ) -> Self {
        Self {
            config,
            broker,
            uploader,
            reviewer,
        }
    }

    /// Enumerate the images a scan of `input` would process.
    pub fn discover(&self, input: &Path) -> Result<Vec<ImageTask>> {
        FileDiscovery::new(&self.config.scan).discover(input)
    }

    /// Scan `input` end to end and write both reports.
    ///
    /// `on_task_done` fires once per finished image, in completion
    /// order. An empty folder is not an error: the scan returns zeroed
    /// stats and writes no reports.
    pub async fn run<F>(&self, input: &Path, on_task_done: F) -> Result<ScanOutcome>
    where
        F: Fn(&TaskReport) + Send + Sync + 'static,
    {
        let tasks = self.discover(input)?;
        self.run_tasks(input, tasks, on_task_done).await
    }

    /// Scan an already-discovered task list. Callers that need the task
    /// count up front (progress bars) discover first and hand the list in.
    pub async fn run_tasks<F>(
        &self,
        input: &Path,
        tasks: Vec<ImageTask>,
        on_task_done: F,
    ) -> Result<ScanOutcome>
    where
        F: Fn(&TaskReport) + Send + Sync + 'static,
    {
        let run_start = Instant::now();

        let quarantine_dir = self.config.quarantine_dir(input);
        let report_path = self.config.report_path(input);
        let timing_path = report::timing_report_path(&report_path);

        if tasks.is_empty() {
            tracing::warn!(input = %input.display(), "no images with recognized extensions found");
            return Ok(ScanOutcome {
                stats: ScanStats::default(),
                reports: Vec::new(),
                report_path,
                timing_path,
                quarantine_dir,
            });
        }
        tracing::info!(
            input = %input.display(),
            images = tasks.len(),
            workers = self.config.scan.workers,
            "starting scan"
        );

        tokio::fs::create_dir_all(&quarantine_dir)
            .await
            .map_err(|e| PicketError::CreateDir {
                path: quarantine_dir.clone(),
                source: e,
            })?;

        let runner = TaskRunner::new(
            &self.config,
            quarantine_dir.clone(),
            self.broker.clone(),
            self.uploader.clone(),
            self.reviewer.clone(),
        );
        let scheduler = Scheduler::new(runner, self.config.scan.workers);
        let mut reports = scheduler.run(tasks, on_task_done).await;

        // Report rows in name order, whatever order the pool finished in.
        reports.sort_by(|a, b| a.verdict.file_name.cmp(&b.verdict.file_name));

        let verdicts: Vec<Verdict> = reports.iter().map(|r| r.verdict.clone()).collect();
        let timings: Vec<TimingRecord> = reports.iter().map(|r| r.timing.clone()).collect();
        report::write_reports(&report_path, &timing_path, &verdicts, &timings)?;

        let stats = ScanStats {
            total: reports.len(),
            flagged: reports.iter().filter(|r| r.quarantined).count(),
            failed: reports
                .iter()
                .filter(|r| r.verdict.review_message.is_none())
                .count(),
            total_seconds: run_start.elapsed().as_secs_f64(),
        };
        tracing::info!(
            total = stats.total,
            flagged = stats.flagged,
            failed = stats.failed,
            elapsed_secs = stats.total_seconds,
            "scan finished"
        );

        Ok(ScanOutcome {
            stats,
            reports,
            report_path,
            timing_path,
            quarantine_dir,
        })
    }
}
