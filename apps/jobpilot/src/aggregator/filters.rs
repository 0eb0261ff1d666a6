use tracing::debug;

use crate::models::profile::Preferences;
use crate::models::Job;

/// Drops jobs the candidate has ruled out. Jobs without salary data are kept
/// when a salary floor is set; the scorer decides how much that matters.
pub fn apply(jobs: Vec<Job>, prefs: &Preferences) -> Vec<Job> {
    let excluded_companies: Vec<String> = prefs
        .excluded_companies
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    let excluded_keywords: Vec<String> = prefs
        .excluded_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    let before = jobs.len();
    let kept: Vec<Job> = jobs
        .into_iter()
        .filter(|job| {
            let company = job.company.to_lowercase();
            if excluded_companies.iter().any(|c| company.contains(c.as_str())) {
                return false;
            }
            let title = job.title.to_lowercase();
            if excluded_keywords.iter().any(|k| title.contains(k.as_str())) {
                return false;
            }
            if prefs.remote_only && !job.remote {
                return false;
            }
            match (prefs.min_salary, job.salary_max) {
                (Some(floor), Some(max)) if max < floor => false,
                _ => true,
            }
        })
        .collect();

    debug!("Filters removed {} of {} jobs", before - kept.len(), before);
    kept
}
