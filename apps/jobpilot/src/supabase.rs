//! Supabase (PostgREST) client for the multi-user deployment.
//!
//! Tables: `users` (id, email, automation_enabled), `profiles` (user_id, data),
//! `jobs` (upserted per user) and `automation_runs` (one row per run).

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::automation::RunSummary;
use crate::models::{Job, Profile};

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Supabase returned status {status}: {message}")]
    Api { status: u16, message: String },
}

/// A row of `users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub automation_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    data: Profile,
}

#[derive(Debug, Serialize)]
struct JobRow<'a> {
    user_id: &'a str,
    job_id: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    url: &'a str,
    source: &'a str,
    score: u8,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    remote: bool,
    discovered_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self, SupabaseError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        })
    }

    fn request(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(builder: RequestBuilder) -> Result<reqwest::Response, SupabaseError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(SupabaseError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Users who opted into scheduled runs.
    pub async fn active_users(&self) -> Result<Vec<UserRecord>, SupabaseError> {
        let builder = self
            .request(reqwest::Method::GET, "users")
            .query(&[
                ("automation_enabled", "eq.true"),
                ("select", "id,email,automation_enabled"),
            ]);
        let users: Vec<UserRecord> = Self::send(builder).await?.json().await?;
        debug!("Supabase returned {} active users", users.len());
        Ok(users)
    }

    pub async fn profile(&self, user_id: &str) -> Result<Option<Profile>, SupabaseError> {
        let filter = format!("eq.{user_id}");
        let builder = self
            .request(reqwest::Method::GET, "profiles")
            .query(&[("user_id", filter.as_str()), ("select", "data"), ("limit", "1")]);
        let rows: Vec<ProfileRow> = Self::send(builder).await?.json().await?;
        Ok(rows.into_iter().next().map(|r| r.data))
    }

    /// Inserts or updates the user's jobs keyed by (user_id, job_id).
    pub async fn upsert_jobs(&self, user_id: &str, jobs: &[Job]) -> Result<usize, SupabaseError> {
        if jobs.is_empty() {
            return Ok(0);
        }
        let now = Utc::now();
        let rows: Vec<JobRow<'_>> = jobs
            .iter()
            .map(|job| JobRow {
                user_id,
                job_id: &job.id,
                title: &job.title,
                company: &job.company,
                location: &job.location,
                url: &job.url,
                source: job.source.as_str(),
                score: job.score,
                salary_min: job.salary_min,
                salary_max: job.salary_max,
                remote: job.remote,
                discovered_at: now,
            })
            .collect();

        let builder = self
            .request(reqwest::Method::POST, "jobs")
            .query(&[("on_conflict", "user_id,job_id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows);
        Self::send(builder).await?;
        Ok(rows.len())
    }

    pub async fn record_run(&self, summary: &RunSummary) -> Result<(), SupabaseError> {
        let builder = self
            .request(reqwest::Method::POST, "automation_runs")
            .header("Prefer", "return=minimal")
            .json(summary);
        Self::send(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobSourceKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(format!("{}/", server.uri()), "service-key").unwrap()
    }

    #[tokio::test]
    async fn test_active_users_sends_auth_and_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("automation_enabled", "eq.true"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "u1", "email": "a@example.com", "automation_enabled": true}
            ])))
            .mount(&server)
            .await;

        let users = client(&server).active_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u1");
    }

    #[tokio::test]
    async fn test_profile_missing_row_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("user_id", "eq.u2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(client(&server).profile("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_row_is_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"data": {"personal": {"name": "Kim", "email": "kim@example.com"}}}
            ])))
            .mount(&server)
            .await;

        let profile = client(&server).profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.personal.name, "Kim");
    }

    #[tokio::test]
    async fn test_upsert_jobs_merges_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/jobs"))
            .and(query_param("on_conflict", "user_id,job_id"))
            .and(header("prefer", "resolution=merge-duplicates"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let jobs = vec![Job::new(JobSourceKind::RemoteOk, "Dev", "Acme", "Remote", "u")];
        let written = client(&server).upsert_jobs("u1", &jobs).await.unwrap();
        assert_eq!(written, 1);

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body[0]["user_id"], "u1");
        assert_eq!(body[0]["source"], "remoteok");
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        match client(&server).active_users().await {
            Err(SupabaseError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
