use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::models::ApplicationKit;
use crate::storage::StorageError;

const MAX_SLUG_CHARS: usize = 50;
const JOB_ID_CHARS: usize = 8;

/// Writes each kit to its own folder: `kit.json` plus one Markdown file per document.
#[derive(Debug, Clone)]
pub struct KitStore {
    dir: PathBuf,
}

impl KitStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<date>/<company>_<title>_<job id prefix>`. The id prefix keeps the same
    /// role posted in two locations in separate folders.
    pub fn kit_dir(&self, kit: &ApplicationKit, date: NaiveDate) -> PathBuf {
        let id: String = slug(&kit.job_id).chars().take(JOB_ID_CHARS).collect();
        self.dir
            .join(date.format("%Y-%m-%d").to_string())
            .join(format!("{}_{}_{}", slug(&kit.company), slug(&kit.job_title), id))
    }

    pub fn save(&self, kit: &ApplicationKit, date: NaiveDate) -> Result<PathBuf, StorageError> {
        let dir = self.kit_dir(kit, date);
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let write = |name: &str, contents: &str| -> Result<(), StorageError> {
            let path = dir.join(name);
            fs::write(&path, contents).map_err(|e| StorageError::io(&path, e))
        };

        write("kit.json", &serde_json::to_string_pretty(kit)?)?;
        write("resume.md", &kit.resume)?;
        write("cover_letter.md", &kit.cover_letter)?;
        write("outreach.md", &kit.outreach_message)?;
        write("learning_path.md", &kit.learning_path)?;

        info!("Saved kit for '{}' at {} to {}", kit.job_title, kit.company, dir.display());
        Ok(dir)
    }
}

/// Filesystem-safe name: ASCII alphanumerics kept, runs of anything else become `_`.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed: String = out.trim_matches('_').chars().take(MAX_SLUG_CHARS).collect();
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed
    }
}
