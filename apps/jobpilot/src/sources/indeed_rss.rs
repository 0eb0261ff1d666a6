use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{Job, JobSourceKind};
use crate::sources::text::strip_html;
use crate::sources::{JobSource, SearchQuery, SourceError};

const INDEED_RSS_URL: &str = "https://rss.indeed.com/rss";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Indeed RSS feed. Item titles carry company and location:
/// `Title - Company - City, ST`.
pub struct IndeedRssSource {
    client: Client,
    base_url: String,
}

impl IndeedRssSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: INDEED_RSS_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn map_item(item: RssItem) -> Job {
        let (title, company, location) = split_title(&item.title);
        let posted_at = item
            .pub_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
            .map(|d| d.with_timezone(&Utc));

        Job::new(JobSourceKind::IndeedRss, title, company, location, item.link.trim())
            .with_description(strip_html(&item.description))
            .with_posted_at(posted_at)
    }
}

/// Splits `Title - Company - Location` from the right, so hyphens inside the
/// title survive. Missing parts come back empty.
fn split_title(raw: &str) -> (String, String, String) {
    let parts: Vec<&str> = raw.rsplitn(3, " - ").collect();
    match parts.as_slice() {
        [location, company, title] => (
            title.trim().to_string(),
            company.trim().to_string(),
            location.trim().to_string(),
        ),
        [company, title] => (title.trim().to_string(), company.trim().to_string(), String::new()),
        _ => (raw.trim().to_string(), String::new(), String::new()),
    }
}

#[async_trait]
impl JobSource for IndeedRssSource {
    fn name(&self) -> &str {
        "Indeed RSS"
    }

    fn kind(&self) -> JobSourceKind {
        JobSourceKind::IndeedRss
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
        let keywords = if query.remote_only {
            format!("{} remote", query.keywords)
        } else {
            query.keywords.clone()
        };
        let mut params: Vec<(&str, String)> = vec![("q", keywords), ("sort", "date".to_string())];
        if let Some(location) = &query.location {
            params.push(("l", location.clone()));
        }

        let response = self.client.get(&self.base_url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let feed: Rss =
            quick_xml::de::from_str(&body).map_err(|e| SourceError::parse(self.name(), e))?;

        Ok(feed
            .channel
            .items
            .into_iter()
            .take(query.max_results)
            .map(Self::map_item)
            .collect())
    }
}
