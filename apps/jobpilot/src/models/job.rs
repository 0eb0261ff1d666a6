use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::dedup::dedup_key;

/// Which adapter produced a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSourceKind {
    Adzuna,
    IndeedRss,
    #[serde(rename = "remoteok")]
    RemoteOk,
    #[serde(rename = "usajobs")]
    UsaJobs,
    #[serde(rename = "themuse")]
    TheMuse,
    HtmlBoard,
}

impl JobSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSourceKind::Adzuna => "adzuna",
            JobSourceKind::IndeedRss => "indeed_rss",
            JobSourceKind::RemoteOk => "remoteok",
            JobSourceKind::UsaJobs => "usajobs",
            JobSourceKind::TheMuse => "themuse",
            JobSourceKind::HtmlBoard => "html_board",
        }
    }
}

impl fmt::Display for JobSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized job listing. `id` is the dedup hash, so two listings with the
/// same title/company/location share an id regardless of source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub source: JobSourceKind,
    pub posted_at: Option<DateTime<Utc>>,
    pub remote: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 0 – 100. Zero until a scorer has run.
    #[serde(default)]
    pub score: u8,
}

impl Job {
    pub fn new(
        source: JobSourceKind,
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let title = title.into().trim().to_string();
        let company = company.into().trim().to_string();
        let location = location.into().trim().to_string();
        let id = dedup_key(&title, &company, Some(&location));
        let remote = looks_remote(&location);

        Self {
            id,
            title,
            company,
            location,
            description: String::new(),
            url: url.into(),
            salary_min: None,
            salary_max: None,
            source,
            posted_at: None,
            remote,
            tags: Vec::new(),
            score: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        if !self.remote {
            self.remote = mentions_remote(&self.description);
        }
        self
    }

    pub fn with_salary(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.salary_min = min.filter(|v| *v > 0.0);
        self.salary_max = max.filter(|v| *v > 0.0);
        self
    }

    pub fn with_posted_at(mut self, posted_at: Option<DateTime<Utc>>) -> Self {
        self.posted_at = posted_at;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = self.remote || remote;
        self
    }

    /// Human-readable salary range, e.g. "$120,000 – $150,000".
    pub fn salary_display(&self) -> Option<String> {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) if (max - min).abs() > f64::EPSILON => {
                Some(format!("${} – ${}", thousands(min), thousands(max)))
            }
            (Some(v), _) | (_, Some(v)) => Some(format!("${}", thousands(v))),
            _ => None,
        }
    }

    /// Lowercased title + description, used by keyword matching.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.tags.join(" ")).to_lowercase()
    }
}

fn looks_remote(location: &str) -> bool {
    let lower = location.to_lowercase();
    lower.contains("remote") || lower.contains("anywhere") || lower.contains("worldwide")
}

fn mentions_remote(description: &str) -> bool {
    let lower = description.to_lowercase();
    lower.contains("fully remote") || lower.contains("100% remote") || lower.contains("remote-first")
}

fn thousands(value: f64) -> String {
    let digits = (value.round() as i64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
