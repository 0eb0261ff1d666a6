use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::models::Job;
use crate::storage::StorageError;

/// Markdown table of ranked jobs, best first as given.
pub fn render_markdown(jobs: &[Job], date: NaiveDate) -> String {
    let mut out = format!("# Job matches for {}\n\n", date.format("%B %-d, %Y"));

    if jobs.is_empty() {
        out.push_str("No jobs matched your preferences today.\n");
        return out;
    }

    out.push_str(&format!("{} jobs ranked by match score.\n\n", jobs.len()));
    out.push_str("| # | Score | Title | Company | Location | Salary | Source |\n");
    out.push_str("|---|------:|-------|---------|----------|--------|--------|\n");
    for (i, job) in jobs.iter().enumerate() {
        let location = if job.remote && !job.location.to_lowercase().contains("remote") {
            format!("{} (remote)", job.location)
        } else {
            job.location.clone()
        };
        out.push_str(&format!(
            "| {} | {} | [{}]({}) | {} | {} | {} | {} |\n",
            i + 1,
            job.score,
            escape_cell(&job.title),
            job.url,
            escape_cell(&job.company),
            escape_cell(&location),
            job.salary_display().unwrap_or_else(|| "—".to_string()),
            job.source
        ));
    }
    out
}

/// Writes `<dir>/jobs_<date>.md`.
pub fn write_report(dir: &Path, jobs: &[Job], date: NaiveDate) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
    let path = dir.join(format!("jobs_{}.md", date.format("%Y-%m-%d")));
    fs::write(&path, render_markdown(jobs, date)).map_err(|e| StorageError::io(&path, e))?;
    Ok(path)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
