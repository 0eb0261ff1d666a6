use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::AdzunaCredentials;
use crate::models::{Job, JobSourceKind};
use crate::sources::text::strip_html;
use crate::sources::{JobSource, SearchQuery, SourceError};

const ADZUNA_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
/// Adzuna caps `results_per_page` at 50.
const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct AdzunaResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    redirect_url: String,
    created: Option<String>,
    company: Option<DisplayName>,
    location: Option<DisplayName>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    category: Option<Category>,
    contract_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(default)]
    label: String,
}

/// Adzuna search API (JSON).
pub struct AdzunaSource {
    client: Client,
    credentials: AdzunaCredentials,
    base_url: String,
}

impl AdzunaSource {
    pub fn new(client: Client, credentials: AdzunaCredentials) -> Self {
        Self {
            client,
            credentials,
            base_url: ADZUNA_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn map_job(raw: AdzunaJob) -> Job {
        let company = raw.company.map(|c| c.display_name).unwrap_or_default();
        let location = raw.location.map(|l| l.display_name).unwrap_or_default();
        let posted_at = raw
            .created
            .as_deref()
            .and_then(|c| DateTime::parse_from_rfc3339(c).ok())
            .map(|d| d.with_timezone(&Utc));

        let mut tags = Vec::new();
        if let Some(category) = raw.category.filter(|c| !c.label.is_empty()) {
            tags.push(category.label);
        }
        if let Some(contract) = raw.contract_time {
            tags.push(contract);
        }

        Job::new(
            JobSourceKind::Adzuna,
            strip_html(&raw.title),
            company,
            location,
            raw.redirect_url,
        )
        .with_description(strip_html(&raw.description))
        .with_salary(raw.salary_min, raw.salary_max)
        .with_posted_at(posted_at)
        .with_tags(tags)
    }
}

#[async_trait]
impl JobSource for AdzunaSource {
    fn name(&self) -> &str {
        "Adzuna"
    }

    fn kind(&self) -> JobSourceKind {
        JobSourceKind::Adzuna
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
        let url = format!("{}/{}/search/1", self.base_url, self.credentials.country);

        let what = if query.remote_only && !query.keywords.to_lowercase().contains("remote") {
            format!("{} remote", query.keywords)
        } else {
            query.keywords.clone()
        };

        let mut params: Vec<(&str, String)> = vec![
            ("app_id", self.credentials.app_id.clone()),
            ("app_key", self.credentials.app_key.clone()),
            ("results_per_page", query.max_results.min(MAX_PAGE_SIZE).to_string()),
            ("what", what),
            ("content-type", "application/json".to_string()),
        ];
        if let Some(location) = &query.location {
            params.push(("where", location.clone()));
        }
        if let Some(salary_min) = query.salary_min {
            params.push(("salary_min", format!("{}", salary_min.round() as i64)));
        }

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body: AdzunaResponse = response
            .json()
            .await
            .map_err(|e| SourceError::parse(self.name(), e))?;

        let jobs: Vec<Job> = body.results.into_iter().map(Self::map_job).collect();
        debug!("Adzuna returned {} jobs for '{}'", jobs.len(), query.keywords);
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> AdzunaCredentials {
        AdzunaCredentials {
            app_id: "id".into(),
            app_key: "key".into(),
            country: "gb".into(),
        }
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gb/search/1"))
            .and(query_param("app_id", "id"))
            .and(query_param("what", "rust engineer"))
            .and(query_param("where", "London"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "results": [
                    {
                        "title": "<strong>Rust</strong> Engineer",
                        "description": "Write <em>Rust</em> services",
                        "redirect_url": "https://adzuna.example/1",
                        "created": "2024-05-01T10:00:00Z",
                        "company": {"display_name": "Acme"},
                        "location": {"display_name": "London"},
                        "salary_min": 70000.0,
                        "salary_max": 90000.0,
                        "category": {"label": "IT Jobs"},
                        "contract_time": "full_time"
                    },
                    {
                        "title": "Rust Engineer",
                        "redirect_url": "https://adzuna.example/2",
                        "company": {"display_name": "Globex"}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let source = AdzunaSource::new(Client::new(), credentials()).with_base_url(server.uri());
        let mut query = SearchQuery::new("rust engineer");
        query.location = Some("London".into());

        let jobs = source.search(&query).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Rust Engineer");
        assert_eq!(jobs[0].company, "Acme");
        assert_eq!(jobs[0].description, "Write Rust services");
        assert_eq!(jobs[0].salary_max, Some(90000.0));
        assert!(jobs[0].posted_at.is_some());
        assert_eq!(jobs[0].tags, vec!["IT Jobs", "full_time"]);
        assert_eq!(jobs[1].location, "");
        assert_eq!(jobs[1].source, JobSourceKind::Adzuna);
    }

    #[tokio::test]
    async fn test_search_surfaces_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let source = AdzunaSource::new(Client::new(), credentials()).with_base_url(server.uri());
        let err = source.search(&SearchQuery::new("rust")).await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_remote_only_appends_remote_keyword() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("what", "rust remote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let source = AdzunaSource::new(Client::new(), credentials()).with_base_url(server.uri());
        let mut query = SearchQuery::new("rust");
        query.remote_only = true;
        assert!(source.search(&query).await.unwrap().is_empty());
    }
}
