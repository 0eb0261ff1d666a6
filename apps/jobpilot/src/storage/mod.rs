//! On-disk outputs: CSV trackers, kit folders and Markdown reports.
//!
//! Layout under the output directory (per user when a user id is given):
//!
//! ```text
//! jobs.csv
//! applications.csv
//! kits/<date>/<company>_<title>_<job id prefix>/
//! reports/jobs_<date>.md
//! ```

pub mod kits;
pub mod report;
pub mod tracker;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use kits::KitStore;
pub use tracker::{ApplicationRecord, ApplicationTracker, JobTracker, TrackedJob};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Every output location for one user (or the single-user install).
#[derive(Debug, Clone)]
pub struct Storage {
    pub root: PathBuf,
    pub jobs: JobTracker,
    pub applications: ApplicationTracker,
    pub kits: KitStore,
}

impl Storage {
    pub fn new(output_dir: &Path, user_id: Option<&str>) -> Self {
        let root = match user_id {
            Some(id) => output_dir.join("users").join(kits::slug(id)),
            None => output_dir.to_path_buf(),
        };
        Self {
            jobs: JobTracker::new(root.join("jobs.csv")),
            applications: ApplicationTracker::new(root.join("applications.csv")),
            kits: KitStore::new(root.join("kits")),
            root,
        }
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    Ok(())
}
