//! Image moderation pipeline components.
//!
//! This module contains the stages of the moderation pipeline:
//! - **discovery**: Find image files in the input folder
//! - **compress**: Re-encode oversized images below the byte bound
//! - **runner**: Walk one image through every stage
//! - **scheduler**: Dispatch tasks across the bounded worker pool
//! - **scan**: Orchestrate a whole folder and write the reports

pub mod compress;
pub mod discovery;
pub mod runner;
pub mod scan;
pub mod scheduler;

// Re-exports for convenient access
pub use compress::{CompressedFile, Compressor};
pub use discovery::FileDiscovery;
pub use runner::TaskRunner;
pub use scan::{ScanJob, ScanOutcome};
pub use scheduler::Scheduler;
