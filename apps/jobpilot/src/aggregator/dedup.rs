use std::collections::HashMap;

use md5::{Digest, Md5};

use crate::models::Job;

/// Dedup hash: MD5 of lowercased, whitespace-collapsed `company|title[|location]`.
///
/// This is a heuristic. "Sr. Engineer" and "Senior Engineer" at the same
/// company hash differently; two unrelated postings with identical titles at
/// the same company and location collapse into one.
pub fn dedup_key(title: &str, company: &str, location: Option<&str>) -> String {
    let mut key = format!("{}|{}", normalize(company), normalize(title));
    if let Some(location) = location {
        key.push('|');
        key.push_str(&normalize(location));
    }
    format!("{:x}", Md5::digest(key.as_bytes()))
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Removes duplicates, keeping the first occurrence in input order.
///
/// Missing salary, description and posting date on the kept job are
/// backfilled from later duplicates. With `include_location = false` the
/// same role posted in several cities collapses to one entry.
pub fn dedupe(jobs: Vec<Job>, include_location: bool) -> Vec<Job> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(jobs.len());
    let mut kept: Vec<Job> = Vec::with_capacity(jobs.len());

    for mut job in jobs {
        let key = if include_location {
            dedup_key(&job.title, &job.company, Some(&job.location))
        } else {
            dedup_key(&job.title, &job.company, None)
        };

        match index.get(&key) {
            Some(&pos) => backfill(&mut kept[pos], job),
            None => {
                job.id = key.clone();
                index.insert(key, kept.len());
                kept.push(job);
            }
        }
    }

    kept
}

fn backfill(kept: &mut Job, duplicate: Job) {
    if kept.salary_min.is_none() {
        kept.salary_min = duplicate.salary_min;
    }
    if kept.salary_max.is_none() {
        kept.salary_max = duplicate.salary_max;
    }
    if kept.description.trim().is_empty() {
        kept.description = duplicate.description;
    }
    if kept.posted_at.is_none() {
        kept.posted_at = duplicate.posted_at;
    }
    kept.remote = kept.remote || duplicate.remote;
}
