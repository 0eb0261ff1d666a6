//! Job board adapters.
//!
//! Each adapter performs one HTTP GET per query and maps the board's payload
//! into [`Job`]. Adapters report failures as [`SourceError`]; the aggregator
//! decides to log and continue.

pub mod adzuna;
pub mod html_board;
pub mod indeed_rss;
pub mod remoteok;
pub mod text;
pub mod themuse;
pub mod usajobs;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::profile::Preferences;
use crate::models::{Job, JobSourceKind};

pub use adzuna::AdzunaSource;
pub use html_board::HtmlBoardSource;
pub use indeed_rss::IndeedRssSource;
pub use remoteok::RemoteOkSource;
pub use themuse::TheMuseSource;
pub use usajobs::UsaJobsSource;

/// Desktop browser UA; several boards reject obvious bot agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} returned status {status}")]
    Status { source_name: String, status: u16 },

    #[error("Failed to parse {source_name} response: {message}")]
    Parse { source_name: String, message: String },

    #[error("Invalid board definition: {0}")]
    InvalidBoard(String),
}

impl SourceError {
    pub fn parse(source_name: &str, message: impl ToString) -> Self {
        SourceError::Parse {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }
}

/// One search against every enabled board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: Option<String>,
    #[serde(default)]
    pub remote_only: bool,
    pub salary_min: Option<f64>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    25
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: None,
            remote_only: false,
            salary_min: None,
            max_results: default_max_results(),
        }
    }

    /// Builds one query per target title, falling back to the joined keywords.
    /// The first preferred location is used; boards take a single location.
    pub fn from_preferences(prefs: &Preferences) -> Vec<SearchQuery> {
        let mut terms: Vec<String> = prefs
            .target_titles
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            let joined = prefs
                .keywords
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !joined.is_empty() {
                terms.push(joined);
            }
        }

        let location = prefs
            .locations
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty() && !l.eq_ignore_ascii_case("remote"))
            .map(str::to_string);

        terms
            .into_iter()
            .map(|keywords| SearchQuery {
                keywords,
                location: location.clone(),
                remote_only: prefs.remote_only,
                salary_min: prefs.min_salary,
                max_results: prefs.results_per_source.max(1),
            })
            .collect()
    }

    /// Lowercased query terms, for boards that only support local filtering.
    pub fn terms(&self) -> Vec<String> {
        self.keywords
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect()
    }

    /// True when every query term appears in the job text.
    pub fn matches_text(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.terms().iter().all(|t| haystack.contains(t.as_str()))
    }
}

/// A job board adapter.
#[async_trait]
pub trait JobSource: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> JobSourceKind;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError>;
}

/// Shared HTTP client for adapters: browser UA, 30s timeout.
pub fn http_client() -> Result<Client, SourceError> {
    Ok(Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?)
}

/// Builds every adapter the configuration enables.
pub fn build_sources(config: &Config) -> anyhow::Result<Vec<Arc<dyn JobSource>>> {
    let client = http_client()?;
    let mut sources: Vec<Arc<dyn JobSource>> = Vec::new();

    match &config.adzuna {
        Some(creds) => sources.push(Arc::new(AdzunaSource::new(client.clone(), creds.clone()))),
        None => info!("Adzuna disabled (ADZUNA_APP_ID / ADZUNA_APP_KEY not set)"),
    }
    match &config.usajobs {
        Some(creds) => sources.push(Arc::new(UsaJobsSource::new(client.clone(), creds.clone()))),
        None => info!("USAJobs disabled (USAJOBS_API_KEY / USAJOBS_EMAIL not set)"),
    }
    if config.enable_indeed_rss {
        sources.push(Arc::new(IndeedRssSource::new(client.clone())));
    }
    if config.enable_remoteok {
        sources.push(Arc::new(RemoteOkSource::new(client.clone())));
    }
    if config.enable_themuse {
        sources.push(Arc::new(TheMuseSource::new(client.clone())));
    }

    if let Some(path) = &config.boards_path {
        match html_board::load_definitions(path) {
            Ok(boards) => {
                for board in boards {
                    sources.push(Arc::new(HtmlBoardSource::new(client.clone(), board)?));
                }
            }
            Err(e) => warn!("Ignoring board definitions at {}: {e}", path.display()),
        }
    }

    info!(
        "Job sources enabled: {}",
        sources.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
    );
    Ok(sources)
}
