//! The `picket scan` command for reviewing a folder of images.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use picket_core::{Config, ScanJob, ScanOutcome, TaskReport};

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Folder of images to review
    #[arg(required = true)]
    pub input: PathBuf,

    /// Quarantine folder for flagged images (default: <input>/quarantine)
    #[arg(short, long)]
    pub quarantine: Option<String>,

    /// Verdict report destination (default: <input>/verdicts.csv)
    #[arg(short, long)]
    pub report: Option<String>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Re-encode images larger than this many KiB before upload
    #[arg(long)]
    pub max_kib: Option<u64>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Execute the scan command.
pub async fn execute(args: ScanArgs, mut config: Config) -> anyhow::Result<()> {
    // Validate input path exists
    if !args.input.exists() {
        anyhow::bail!(
            "Input folder does not exist: {:?}\n\n  Hint: Check the folder path and try again.",
            args.input
        );
    }
    if !args.input.is_dir() {
        anyhow::bail!(
            "Input path is not a folder: {:?}\n\n  Hint: `picket scan` reviews whole folders.",
            args.input
        );
    }

    // The endpoints are deployment-specific and ship unset.
    if let Some(endpoint) = config.endpoints.first_unset() {
        anyhow::bail!(
            "The `{endpoint}` endpoint is not configured.\n\n  \
             Hint: Run `picket config init` and fill in the [endpoints] section."
        );
    }

    apply_overrides(&mut config, &args);

    let job = ScanJob::new(config);
    let tasks = job.discover(&args.input)?;
    if tasks.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to review", tasks.len());

    // Set up progress bar
    let progress = if args.no_progress {
        None
    } else {
        Some(create_progress_bar(tasks.len() as u64))
    };

    let progress_cb = progress.clone();
    let start_time = Instant::now();
    let on_done = move |_report: &TaskReport| {
        if let Some(pb) = &progress_cb {
            pb.inc(1);
            let elapsed = start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let rate = pb.position() as f64 / elapsed;
                pb.set_message(format!("{rate:.1} img/sec"));
            }
        }
    };

    let outcome = job.run_tasks(&args.input, tasks, on_done).await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    print_summary(&outcome);
    Ok(())
}

/// Fold the command-line flags into the loaded configuration.
fn apply_overrides(config: &mut Config, args: &ScanArgs) {
    if let Some(quarantine) = &args.quarantine {
        config.scan.quarantine_dir = Some(quarantine.clone());
    }
    if let Some(report) = &args.report {
        config.scan.report_path = Some(report.clone());
    }
    if let Some(workers) = args.workers {
        config.scan.workers = workers.max(1);
    }
    if let Some(max_kib) = args.max_kib {
        config.compression.max_bytes = max_kib * 1024;
    }
}

/// Create a progress bar for the scan.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the scan.
fn print_summary(outcome: &ScanOutcome) {
    let stats = &outcome.stats;
    let rate = if stats.total_seconds > 0.0 {
        stats.total as f64 / stats.total_seconds
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Reviewed:     {:>8}", stats.total);
    eprintln!("    Flagged:      {:>8}", stats.flagged);
    if stats.failed > 0 {
        eprintln!("    No verdict:   {:>8}", stats.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
    eprintln!();
    eprintln!("  Verdicts: {}", outcome.report_path.display());
    eprintln!("  Timings:  {}", outcome.timing_path.display());
    if stats.flagged > 0 {
        eprintln!("  Quarantine: {}", outcome.quarantine_dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(input: &str) -> ScanArgs {
        ScanArgs {
            input: PathBuf::from(input),
            quarantine: None,
            report: None,
            workers: None,
            max_kib: None,
            no_progress: true,
        }
    }

    #[test]
    fn test_apply_overrides_sets_paths_and_workers() {
        let mut config = Config::default();
        let mut args = args_for("/tmp/in");
        args.quarantine = Some("~/flagged".to_string());
        args.report = Some("./out/verdicts.csv".to_string());
        args.workers = Some(4);
        args.max_kib = Some(512);

        apply_overrides(&mut config, &args);

        assert_eq!(config.scan.quarantine_dir.as_deref(), Some("~/flagged"));
        assert_eq!(
            config.scan.report_path.as_deref(),
            Some("./out/verdicts.csv")
        );
        assert_eq!(config.scan.workers, 4);
        assert_eq!(config.compression.max_bytes, 512 * 1024);
    }

    #[test]
    fn test_apply_overrides_leaves_config_alone_when_unset() {
        let mut config = Config::default();
        let defaults = Config::default();
        apply_overrides(&mut config, &args_for("/tmp/in"));

        assert_eq!(config.scan.workers, defaults.scan.workers);
        assert_eq!(config.compression.max_bytes, defaults.compression.max_bytes);
        assert!(config.scan.quarantine_dir.is_none());
    }

    #[test]
    fn test_apply_overrides_clamps_zero_workers() {
        let mut config = Config::default();
        let mut args = args_for("/tmp/in");
        args.workers = Some(0);
        apply_overrides(&mut config, &args);
        assert_eq!(config.scan.workers, 1);
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_input() {
        let args = args_for("/definitely/not/a/real/folder");
        let err = execute(args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_execute_rejects_unconfigured_endpoints() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_for(&dir.path().to_string_lossy());
        // Default config ships with empty endpoint URLs.
        let err = execute(args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("picket config init"));
    }

    #[tokio::test]
    async fn test_execute_rejects_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("image.png");
        std::fs::write(&file, b"x").unwrap();

        let args = args_for(&file.to_string_lossy());
        let err = execute(args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("not a folder"));
    }
}
