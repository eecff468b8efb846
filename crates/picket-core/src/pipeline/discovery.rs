//! File discovery for finding images in the input folder.

use std::path::Path;
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::error::PicketError;
use crate::types::ImageTask;

/// Discovers image files at the top level of the input folder.
pub struct FileDiscovery {
    extensions: Vec<String>,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: &ScanConfig) -> Self {
        let extensions = config
            .extensions
            .iter()
            .map(|ext| ext.to_lowercase())
            .collect();
        Self { extensions }
    }

    /// Enumerate recognized image files directly inside `input`.
    ///
    /// Subfolders are not descended into, so a quarantine folder placed
    /// inside the input is never re-scanned. Results are sorted by path
    /// for deterministic dispatch order. An unreadable input folder is
    /// fatal to the run.
    pub fn discover(&self, input: &Path) -> Result<Vec<ImageTask>, PicketError> {
        let mut tasks = Vec::new();

        for entry in WalkDir::new(input).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| PicketError::InputDir {
                path: input.to_path_buf(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() && self.is_supported(entry.path()) {
                tasks.push(ImageTask::from_path(entry.path().to_path_buf()));
            }
        }

        tasks.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        Ok(tasks)
    }

    /// Check if a file has a recognized extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.extensions.iter().any(|known| *known == ext_lower)
            })
            .unwrap_or(false)
    }
}
