//! Picket CLI - Batch content moderation for folders of screenshots.
//!
//! Picket scans a folder of images, submits each one to a remote
//! moderation service, copies flagged images into a quarantine folder,
//! and writes CSV reports of verdicts and per-stage timings.
//!
//! # Usage
//!
//! ```bash
//! # Review every image in a folder
//! picket scan ./screenshots
//!
//! # Custom quarantine folder and report destination
//! picket scan ./screenshots --quarantine ./flagged --report ./out/verdicts.csv
//!
//! # View configuration
//! picket config show
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Picket - Batch content moderation for folders of screenshots.
#[derive(Parser, Debug)]
#[command(name = "picket")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Path to a config file (defaults to the per-user location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a folder of images and quarantine the ones that fail review
    Scan(cli::scan::ScanArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI overrides.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `picket config path`."
            );
            picket_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Picket v{}", picket_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Scan(args) => cli::scan::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref()).await,
    }
}

/// Load config from the explicit `--config` path, or the default location.
fn load_config(path: &Option<PathBuf>) -> Result<picket_core::Config, picket_core::ConfigError> {
    match path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            picket_core::Config::load_from(Path::new(&expanded))
        }
        None => picket_core::Config::load(),
    }
}
