//! Picket Core - Embeddable image moderation pipeline.
//!
//! Picket takes a folder of screenshots, pushes each image through a
//! remote content-moderation service, and separates out the ones that
//! fail review.
//!
//! # Architecture
//!
//! Each image runs the same stage sequence on one worker of a bounded
//! pool, with no state shared between tasks:
//!
//! ```text
//! Image → Compress → Credentials → Upload → Review → Quarantine → Reports
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use picket_core::{Config, ScanJob};
//!
//! #[tokio::main]
//! async fn main() -> picket_core::Result<()> {
//!     let config = Config::load()?;
//!     let job = ScanJob::new(config);
//!
//!     let outcome = job.run("./screenshots".as_ref(), |_| {}).await?;
//!     println!("{} flagged of {}", outcome.stats.flagged, outcome.stats.total);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod remote;
pub mod report;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PicketError, Result, StageError, StageResult};
pub use pipeline::{Compressor, FileDiscovery, ScanJob, ScanOutcome, Scheduler, TaskRunner};
pub use types::{ImageTask, ScanStats, Stage, TaskReport, TimingRecord, Verdict};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
