use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::UsaJobsCredentials;
use crate::models::{Job, JobSourceKind};
use crate::sources::text::strip_html;
use crate::sources::{JobSource, SearchQuery, SourceError};

const USAJOBS_SEARCH_URL: &str = "https://data.usajobs.gov/api/search";
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UsaJobsResponse {
    search_result: SearchResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResult {
    #[serde(default)]
    search_result_items: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResultItem {
    matched_object_descriptor: Descriptor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Descriptor {
    #[serde(default)]
    position_title: String,
    #[serde(default)]
    organization_name: String,
    #[serde(default)]
    position_location_display: String,
    #[serde(rename = "PositionURI", default)]
    position_uri: String,
    #[serde(default)]
    position_remuneration: Vec<Remuneration>,
    publication_start_date: Option<String>,
    user_area: Option<UserArea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Remuneration {
    minimum_range: Option<String>,
    maximum_range: Option<String>,
    rate_interval_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserArea {
    details: Option<Details>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Details {
    job_summary: Option<String>,
}

/// USAJobs search API. Requires `Authorization-Key` and the registered email
/// as `User-Agent`.
pub struct UsaJobsSource {
    client: Client,
    credentials: UsaJobsCredentials,
    base_url: String,
}

impl UsaJobsSource {
    pub fn new(client: Client, credentials: UsaJobsCredentials) -> Self {
        Self {
            client,
            credentials,
            base_url: USAJOBS_SEARCH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn map_item(item: SearchResultItem) -> Job {
        let d = item.matched_object_descriptor;
        let (salary_min, salary_max) = d
            .position_remuneration
            .first()
            .map(annual_salary)
            .unwrap_or((None, None));
        let posted_at = d.publication_start_date.as_deref().and_then(parse_usajobs_date);
        let summary = d
            .user_area
            .and_then(|u| u.details)
            .and_then(|details| details.job_summary)
            .unwrap_or_default();

        Job::new(
            JobSourceKind::UsaJobs,
            d.position_title,
            d.organization_name,
            d.position_location_display,
            d.position_uri,
        )
        .with_description(strip_html(&summary))
        .with_salary(salary_min, salary_max)
        .with_posted_at(posted_at)
    }
}

/// Converts a remuneration entry to annual figures. Hourly rates ("PH") are
/// scaled by 2080 working hours.
fn annual_salary(r: &Remuneration) -> (Option<f64>, Option<f64>) {
    let factor = match r.rate_interval_code.as_deref() {
        Some("PH") => 2080.0,
        _ => 1.0,
    };
    let parse = |v: &Option<String>| {
        v.as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(|n| n * factor)
    };
    (parse(&r.minimum_range), parse(&r.maximum_range))
}

/// USAJobs dates come without an offset, e.g. `2024-05-01T00:00:00.0000`.
fn parse_usajobs_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
        return Some(d.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

#[async_trait]
impl JobSource for UsaJobsSource {
    fn name(&self) -> &str {
        "USAJobs"
    }

    fn kind(&self) -> JobSourceKind {
        JobSourceKind::UsaJobs
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
        let mut params: Vec<(&str, String)> = vec![
            ("Keyword", query.keywords.clone()),
            ("ResultsPerPage", query.max_results.min(MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(location) = &query.location {
            params.push(("LocationName", location.clone()));
        }
        if query.remote_only {
            params.push(("RemoteIndicator", "True".to_string()));
        }
        if let Some(salary_min) = query.salary_min {
            params.push(("RemunerationMinimumAmount", format!("{}", salary_min.round() as i64)));
        }

        let response = self
            .client
            .get(&self.base_url)
            .header("Host", "data.usajobs.gov")
            .header("User-Agent", &self.credentials.email)
            .header("Authorization-Key", &self.credentials.api_key)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: self.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body: UsaJobsResponse = response
            .json()
            .await
            .map_err(|e| SourceError::parse(self.name(), e))?;

        let remote = query.remote_only;
        Ok(body
            .search_result
            .search_result_items
            .into_iter()
            .map(Self::map_item)
            .map(|job| job.with_remote(remote))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> UsaJobsCredentials {
        UsaJobsCredentials {
            api_key: "secret".into(),
            email: "me@example.com".into(),
        }
    }

    #[test]
    fn test_hourly_rates_are_annualised() {
        let r = Remuneration {
            minimum_range: Some("50.00".into()),
            maximum_range: Some("60.00".into()),
            rate_interval_code: Some("PH".into()),
        };
        assert_eq!(annual_salary(&r), (Some(104000.0), Some(124800.0)));
    }

    #[test]
    fn test_parse_dates_without_offset() {
        assert!(parse_usajobs_date("2024-05-01T00:00:00.0000").is_some());
        assert!(parse_usajobs_date("2024-05-01T00:00:00Z").is_some());
        assert!(parse_usajobs_date("yesterday").is_none());
    }

    #[tokio::test]
    async fn test_search_sends_auth_headers_and_maps_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization-Key", "secret"))
            .and(header("User-Agent", "me@example.com"))
            .and(query_param("Keyword", "software engineer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "SearchResult": {
                    "SearchResultCount": 1,
                    "SearchResultItems": [{
                        "MatchedObjectDescriptor": {
                            "PositionTitle": "IT Specialist (Software Engineer)",
                            "OrganizationName": "Department of Energy",
                            "PositionLocationDisplay": "Washington, DC",
                            "PositionURI": "https://www.usajobs.gov/job/1",
                            "PositionRemuneration": [{
                                "MinimumRange": "117962",
                                "MaximumRange": "153354",
                                "RateIntervalCode": "PA"
                            }],
                            "PublicationStartDate": "2024-05-01T00:00:00.0000",
                            "UserArea": {"Details": {"JobSummary": "Develop <b>mission</b> software."}}
                        }
                    }]
                }
            })))
            .mount(&server)
            .await;

        let source = UsaJobsSource::new(Client::new(), credentials()).with_base_url(server.uri());
        let jobs = source.search(&SearchQuery::new("software engineer")).await.unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Department of Energy");
        assert_eq!(jobs[0].salary_min, Some(117962.0));
        assert_eq!(jobs[0].description, "Develop mission software.");
        assert_eq!(jobs[0].source, JobSourceKind::UsaJobs);
    }
}
