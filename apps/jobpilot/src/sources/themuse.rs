use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::models::{Job, JobSourceKind};
use crate::sources::text::strip_html;
use crate::sources::{JobSource, SearchQuery, SourceError};

const THEMUSE_API_URL: &str = "https://www.themuse.com/api/public/jobs";

#[derive(Debug, Deserialize)]
struct MuseResponse {
    #[serde(default)]
    results: Vec<MuseJob>,
}

#[derive(Debug, Deserialize)]
struct MuseJob {
    #[serde(default)]
    name: String,
    #[serde(default)]
    contents: String,
    company: Option<Named>,
    #[serde(default)]
    locations: Vec<Named>,
    #[serde(default)]
    levels: Vec<Named>,
    refs: Option<Refs>,
    publication_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Refs {
    #[serde(default)]
    landing_page: String,
}

/// The Muse public jobs API. It has no keyword parameter, so results are
/// filtered locally against title and contents.
pub struct TheMuseSource {
    client: Client,
    base_url: String,
}

impl TheMuseSource {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: THEMUSE_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn map_job(raw: MuseJob) -> Job {
        let location = raw
            .locations
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let posted_at = raw
            .publication_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));

        Job::new(
            JobSourceKind::TheMuse,
            raw.name,
            raw.company.map(|c| c.name).unwrap_or_default(),
            location,
            raw.refs.map(|r| r.landing_page).unwrap_or_default(),
        )
        .with_description(strip_html(&raw.contents))
        .with_posted_at(posted_at)
        .with_tags(raw.levels.into_iter().map(|l| l.name).collect())
    }
}

#[async_trait]
impl JobSource for TheMuseSource {
    fn name(&self) -> &str {
        "The Muse"
    }

    fn kind(&self) -> JobSourceKind {
        JobSourceKind::TheMuse
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
        let mut params: Vec<(&str, String)> =
            vec![("page", "0".to_string()), ("descending", "true".to_string())];
        if query.remote_only {
            params.push(("location", "Flexible / Remote".to_string()));
        } else if let Some(location) = &query.location {
            params.push(("location", location.clone()));
        }

        let response = self.client.get(&self.base_url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body: MuseResponse = response
            .json()
            .await
            .map_err(|e| SourceError::parse(self.name(), e))?;

        Ok(body
            .results
            .into_iter()
            .filter(|raw| query.matches_text(&format!("{} {}", raw.name, raw.contents)))
            .take(query.max_results)
            .map(Self::map_job)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_filters_and_maps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("location", "Flexible / Remote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 0,
                "results": [
                    {
                        "name": "Data Engineer",
                        "contents": "<p>Python and Spark pipelines</p>",
                        "company": {"name": "Initech"},
                        "locations": [{"name": "Flexible / Remote"}],
                        "levels": [{"name": "Senior Level"}],
                        "refs": {"landing_page": "https://www.themuse.com/jobs/initech/data-engineer"},
                        "publication_date": "2024-05-01T10:00:00Z"
                    },
                    {
                        "name": "Account Executive",
                        "contents": "Sales",
                        "company": {"name": "Initech"},
                        "locations": [],
                        "refs": {"landing_page": "https://www.themuse.com/jobs/initech/ae"}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let source = TheMuseSource::new(Client::new()).with_base_url(server.uri());
        let mut query = SearchQuery::new("data engineer");
        query.remote_only = true;
        let jobs = source.search(&query).await.unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Initech");
        assert_eq!(jobs[0].description, "Python and Spark pipelines");
        assert_eq!(jobs[0].tags, vec!["Senior Level"]);
        assert!(jobs[0].remote);
    }
}
