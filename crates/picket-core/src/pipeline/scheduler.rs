//! Bounded-concurrency dispatch of image tasks.
//!
//! One tokio task per image, gated by a semaphore sized to the worker
//! count. Each worker returns its own report; nothing is shared between
//! tasks, so aggregation is a plain collect after the joins.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::pipeline::runner::TaskRunner;
use crate::types::{ImageTask, TaskReport, TimingRecord, Verdict};

/// Fans image tasks out across a bounded worker pool.
pub struct Scheduler {
    runner: Arc<TaskRunner>,
    workers: usize,
}

impl Scheduler {
    pub fn new(runner: TaskRunner, workers: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            workers: workers.max(1),
        }
    }

    /// Run every task to completion, at most `workers` in flight.
    ///
    /// Calls `on_done` for each finished task so the CLI can tick
    /// progress as results land. Completion order is arbitrary; the
    /// returned reports are in join order, one per dispatched task. A
    /// panicked worker yields a report with no verdict rather than
    /// poisoning the run.
    pub async fn run<F>(&self, tasks: Vec<ImageTask>, on_done: F) -> Vec<TaskReport>
    where
        F: Fn(&TaskReport) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let on_done = Arc::new(on_done);
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("worker semaphore closed unexpectedly, stopping dispatch");
                    break;
                }
            };

            let runner = self.runner.clone();
            let on_done = on_done.clone();
            let file_name = task.file_name.clone();

            let handle = tokio::spawn(async move {
                let report = runner.process(&task).await;
                drop(permit); // Release the worker slot before the callback
                on_done(&report);
                report
            });

            handles.push((file_name, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (file_name, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!(file = %file_name, "worker panicked: {e}");
                    reports.push(TaskReport {
                        verdict: Verdict {
                            file_name: file_name.clone(),
                            review_message: None,
                        },
                        timing: TimingRecord::empty(file_name),
                        quarantined: false,
                    });
                }
            }
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::StageError;
    use crate::remote::{CredentialBroker, ModerationClient, StorageUploader};
    use crate::types::{Credentials, UploadResult};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct StaticBroker;

    #[async_trait]
    impl CredentialBroker for StaticBroker {
        async fn issue(&self, file_name: &str) -> Result<Credentials, StageError> {
            Ok(Credentials {
                token: "tok".to_string(),
                resource_key: file_name.to_string(),
            })
        }
    }

    struct EchoUploader;

    #[async_trait]
    impl StorageUploader for EchoUploader {
        async fn upload(
            &self,
            credentials: &Credentials,
            _path: &Path,
        ) -> Result<UploadResult, StageError> {
            Ok(UploadResult {
                public_url: format!("http://cdn.test/{}", credentials.resource_key),
            })
        }
    }

    /// Reviewer that tracks how many calls are in flight at once.
    struct CountingReviewer {
        in_flight: AtomicU32,
        max_in_flight: AtomicU32,
    }

    impl CountingReviewer {
        fn new() -> Self {
            Self {
                in_flight: AtomicU32::new(0),
                max_in_flight: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ModerationClient for CountingReviewer {
        async fn review(&self, _image_url: &str) -> Result<Option<String>, StageError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Some("机审结果: 正常".to_string()))
        }
    }

    fn make_tasks(dir: &Path, count: usize) -> Vec<ImageTask> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("img-{i}.png"));
                std::fs::write(&path, b"tiny").unwrap();
                ImageTask::from_path(path)
            })
            .collect()
    }

    fn runner_with(reviewer: Arc<dyn ModerationClient>, quarantine: &Path) -> TaskRunner {
        TaskRunner::new(
            &Config::default(),
            quarantine.to_path_buf(),
            Arc::new(StaticBroker),
            Arc::new(EchoUploader),
            reviewer,
        )
    }

    #[tokio::test]
    async fn test_run_yields_one_report_per_task() {
        let dir = tempfile::tempdir().unwrap();
        let quarantine = dir.path().join("quarantine");
        std::fs::create_dir(&quarantine).unwrap();
        let tasks = make_tasks(dir.path(), 6);

        let runner = runner_with(Arc::new(CountingReviewer::new()), &quarantine);
        let scheduler = Scheduler::new(runner, 2);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let reports = scheduler
            .run(tasks, move |report| {
                seen_cb.lock().unwrap().push(report.verdict.file_name.clone());
            })
            .await;

        assert_eq!(reports.len(), 6);
        let names: HashSet<String> = reports
            .iter()
            .map(|r| r.verdict.file_name.clone())
            .collect();
        assert_eq!(names.len(), 6, "no lost or duplicated tasks");
        // Callback fired once per task too.
        assert_eq!(seen.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_run_respects_worker_bound() {
        let dir = tempfile::tempdir().unwrap();
        let quarantine = dir.path().join("quarantine");
        std::fs::create_dir(&quarantine).unwrap();
        let tasks = make_tasks(dir.path(), 8);

        let reviewer = Arc::new(CountingReviewer::new());
        let runner = runner_with(reviewer.clone(), &quarantine);
        let scheduler = Scheduler::new(runner, 3);

        scheduler.run(tasks, |_| {}).await;

        let max = reviewer.max_in_flight.load(Ordering::SeqCst);
        assert!(max >= 1, "pool never ran anything");
        assert!(max <= 3, "pool exceeded its bound: {max} in flight");
    }

    #[tokio::test]
    async fn test_run_with_no_tasks_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let quarantine = dir.path().join("quarantine");
        std::fs::create_dir(&quarantine).unwrap();

        let runner = runner_with(Arc::new(CountingReviewer::new()), &quarantine);
        let scheduler = Scheduler::new(runner, 4);

        let reports = scheduler.run(Vec::new(), |_| {}).await;
        assert!(reports.is_empty());
    }
}
