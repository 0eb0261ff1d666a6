//! CSV trackers for discovered jobs and generated application kits.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{ApplicationKit, Job};
use crate::storage::{ensure_parent, StorageError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedJob {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
    pub score: u8,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub remote: bool,
    pub posted_at: Option<DateTime<Utc>>,
    pub discovered_at: DateTime<Utc>,
}

impl TrackedJob {
    fn from_job(job: &Job, discovered_at: DateTime<Utc>) -> Self {
        Self {
            job_id: job.id.clone(),
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            url: job.url.clone(),
            source: job.source.as_str().to_string(),
            score: job.score,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            remote: job.remote,
            posted_at: job.posted_at,
            discovered_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub url: String,
    pub score: u8,
    pub status: String,
    pub kit_path: String,
    pub generator: String,
    pub generated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn generated(kit: &ApplicationKit, score: u8, kit_path: &Path) -> Self {
        Self {
            job_id: kit.job_id.clone(),
            title: kit.job_title.clone(),
            company: kit.company.clone(),
            url: kit.job_url.clone(),
            score,
            status: "generated".to_string(),
            kit_path: kit_path.display().to_string(),
            generator: kit.generator.clone(),
            generated_at: kit.generated_at,
        }
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// Appends rows, writing the header only when the file is new or empty.
fn append_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StorageError> {
    ensure_parent(path)?;
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StorageError::io(path, e))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| StorageError::io(path, e))?;
    Ok(())
}

/// Every job ever discovered, one row per job id.
#[derive(Debug, Clone)]
pub struct JobTracker {
    path: PathBuf,
}

impl JobTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<TrackedJob>, StorageError> {
        read_rows(&self.path)
    }

    /// Appends jobs whose id is not tracked yet. Returns how many were new.
    pub fn append_new(&self, jobs: &[Job]) -> Result<usize, StorageError> {
        let mut known: HashSet<String> = self.load()?.into_iter().map(|r| r.job_id).collect();
        let now = Utc::now();
        let fresh: Vec<TrackedJob> = jobs
            .iter()
            .filter(|job| known.insert(job.id.clone()))
            .map(|job| TrackedJob::from_job(job, now))
            .collect();

        if !fresh.is_empty() {
            append_rows(&self.path, &fresh)?;
        }
        debug!("Tracked {} new jobs in {}", fresh.len(), self.path.display());
        Ok(fresh.len())
    }
}

/// One row per generated kit.
#[derive(Debug, Clone)]
pub struct ApplicationTracker {
    path: PathBuf,
}

impl ApplicationTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Vec<ApplicationRecord>, StorageError> {
        read_rows(&self.path)
    }

    pub fn append(&self, record: &ApplicationRecord) -> Result<(), StorageError> {
        append_rows(&self.path, std::slice::from_ref(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobSourceKind;

    fn job(title: &str) -> Job {
        Job::new(JobSourceKind::Adzuna, title, "Acme", "Remote", "https://acme.test")
            .with_salary(Some(90_000.0), None)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = JobTracker::new(dir.path().join("jobs.csv"));
        assert!(tracker.load().unwrap().is_empty());
    }

    #[test]
    fn test_append_new_skips_known_ids() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = JobTracker::new(dir.path().join("out/jobs.csv"));

        assert_eq!(tracker.append_new(&[job("Dev"), job("QA")]).unwrap(), 2);
        assert_eq!(tracker.append_new(&[job("Dev"), job("SRE"), job("SRE")]).unwrap(), 1);

        let rows = tracker.load().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].title, "SRE");
        assert_eq!(rows[0].salary_min, Some(90_000.0));
        assert_eq!(rows[0].salary_max, None);

        let raw = std::fs::read_to_string(&tracker.path).unwrap();
        assert_eq!(raw.matches("job_id,title").count(), 1, "header written once");
    }

    #[test]
    fn test_application_tracker_appends() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ApplicationTracker::new(dir.path().join("applications.csv"));
        let kit = ApplicationKit {
            job_id: "abc".into(),
            job_title: "Dev".into(),
            company: "Acme".into(),
            job_url: "https://acme.test".into(),
            resume: String::new(),
            cover_letter: String::new(),
            outreach_message: String::new(),
            learning_path: String::new(),
            generator: "template".into(),
            generated_at: Utc::now(),
        };

        tracker
            .append(&ApplicationRecord::generated(&kit, 77, Path::new("kits/x")))
            .unwrap();
        let rows = tracker.load().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "generated");
        assert_eq!(rows[0].score, 77);
    }
}
