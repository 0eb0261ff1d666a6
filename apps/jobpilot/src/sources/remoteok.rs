use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{Job, JobSourceKind};
use crate::sources::text::strip_html;
use crate::sources::{JobSource, SearchQuery, SourceError};

const REMOTEOK_API_URL: &str = "https://remoteok.com/api";

#[derive(Debug, Deserialize)]
struct RemoteOkJob {
    #[serde(default)]
    position: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
    apply_url: Option<String>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    #[serde(default)]
    tags: Vec<String>,
    date: Option<String>,
}

/// RemoteOK public API. The endpoint returns every live posting; the first
/// array element is a legal notice, and keyword filtering happens locally.
pub struct RemoteOkSource {
    client: Client,
    base_url: String,
}

impl RemoteOkSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: REMOTEOK_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn map_job(raw: RemoteOkJob) -> Job {
        let location = if raw.location.trim().is_empty() {
            "Remote".to_string()
        } else {
            raw.location
        };
        let url = if raw.url.is_empty() {
            raw.apply_url.unwrap_or_default()
        } else {
            raw.url
        };
        let posted_at = raw
            .date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));

        Job::new(JobSourceKind::RemoteOk, raw.position, raw.company, location, url)
            .with_description(strip_html(&raw.description))
            .with_salary(raw.salary_min, raw.salary_max)
            .with_posted_at(posted_at)
            .with_tags(raw.tags)
            .with_remote(true)
    }
}

#[async_trait]
impl JobSource for RemoteOkSource {
    fn name(&self) -> &str {
        "RemoteOK"
    }

    fn kind(&self) -> JobSourceKind {
        JobSourceKind::RemoteOk
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
        let response = self.client.get(&self.base_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let entries: Vec<Value> = response
            .json()
            .await
            .map_err(|e| SourceError::parse(self.name(), e))?;

        let jobs: Vec<Job> = entries
            .into_iter()
            .filter(|v| v.get("position").is_some())
            .filter_map(|v| serde_json::from_value::<RemoteOkJob>(v).ok())
            .filter(|raw| {
                let text = format!("{} {} {}", raw.position, raw.tags.join(" "), raw.description);
                query.matches_text(&text)
            })
            .take(query.max_results)
            .map(Self::map_job)
            .collect();

        debug!("RemoteOK matched {} jobs for '{}'", jobs.len(), query.keywords);
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_skips_legal_notice_and_filters_locally() {
        let server = server_with(json!([
            {"legal": "API Terms of Service"},
            {
                "id": "1",
                "position": "Senior Rust Engineer",
                "company": "Acme",
                "location": "",
                "description": "<p>Build services</p>",
                "url": "https://remoteok.com/1",
                "salary_min": 120000,
                "salary_max": 160000,
                "tags": ["rust", "backend"],
                "date": "2024-05-01T10:00:00+00:00"
            },
            {
                "id": "2",
                "position": "Product Designer",
                "company": "Globex",
                "tags": ["design"],
                "url": "https://remoteok.com/2"
            }
        ]))
        .await;

        let source = RemoteOkSource::new(Client::new()).with_base_url(server.uri());
        let jobs = source.search(&SearchQuery::new("rust")).await.unwrap();

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.title, "Senior Rust Engineer");
        assert_eq!(job.location, "Remote");
        assert!(job.remote);
        assert_eq!(job.description, "Build services");
        assert_eq!(job.salary_min, Some(120000.0));
        assert_eq!(job.tags, vec!["rust", "backend"]);
    }

    #[tokio::test]
    async fn test_respects_max_results() {
        let postings: Vec<Value> = (0..5)
            .map(|i| json!({"position": format!("Rust Dev {i}"), "company": "Acme", "url": format!("u{i}")}))
            .collect();
        let server = server_with(Value::Array(postings)).await;

        let source = RemoteOkSource::new(Client::new()).with_base_url(server.uri());
        let mut query = SearchQuery::new("rust");
        query.max_results = 3;
        assert_eq!(source.search(&query).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_non_array_body_is_parse_error() {
        let server = server_with(json!({"error": "rate limited"})).await;
        let source = RemoteOkSource::new(Client::new()).with_base_url(server.uri());
        let err = source.search(&SearchQuery::new("rust")).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
