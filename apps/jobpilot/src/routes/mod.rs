pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::automation::handlers as automation;
use crate::generation::handlers as generation;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile
        .route(
            "/api/mobile/profile",
            get(profile::handle_get_profile).put(profile::handle_update_profile),
        )
        .route(
            "/api/mobile/profile/completeness",
            get(profile::handle_profile_completeness),
        )
        // Jobs
        .route("/api/mobile/jobs", get(automation::handle_tracked_jobs))
        .route("/api/mobile/jobs/search", post(automation::handle_search_jobs))
        // Kits
        .route("/api/mobile/kits", post(generation::handle_generate_kit))
        // Automation
        .route(
            "/api/mobile/automation/run",
            post(automation::handle_run_automation),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::aggregator::JobAggregator;
    use crate::automation::pipeline::{Pipeline, PipelineSettings};
    use crate::config::Config;
    use crate::generation::KitGenerator;
    use crate::models::{Job, JobSourceKind, Profile};
    use crate::scoring::KeywordJobScorer;
    use crate::sources::{JobSource, SearchQuery, SourceError};

    struct StaticSource(Vec<Job>);

    #[async_trait]
    impl JobSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn kind(&self) -> JobSourceKind {
            JobSourceKind::HtmlBoard
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<Job>, SourceError> {
            Ok(self
                .0
                .iter()
                .filter(|job| query.matches_text(&job.searchable_text()))
                .cloned()
                .collect())
        }
    }

    fn job(title: &str, company: &str) -> Job {
        Job::new(JobSourceKind::HtmlBoard, title, company, "Remote", format!("https://jobs.test/{company}"))
            .with_description("We use Rust, Tokio and PostgreSQL.")
    }

    fn profile() -> Profile {
        let mut profile = Profile::default();
        profile.personal.name = "Ada Lovelace".into();
        profile.personal.email = "ada@example.com".into();
        profile.skills = vec!["Rust".into(), "PostgreSQL".into()];
        profile.preferences.target_titles = vec!["Rust Engineer".into()];
        profile
    }

    fn app(dir: &Path, profile: Option<&Profile>) -> Router {
        let profile_path = dir.join("profile.json");
        if let Some(profile) = profile {
            crate::profile::loader::save_to_file(&profile_path, profile).unwrap();
        }
        let vars: HashMap<String, String> = [
            ("PROFILE_PATH", profile_path.display().to_string()),
            ("OUTPUT_DIR", dir.join("output").display().to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let sources: Vec<Arc<dyn JobSource>> = vec![Arc::new(StaticSource(vec![
            job("Rust Engineer", "Acme"),
            job("Senior Rust Engineer", "Globex"),
            job("Accountant", "Initech"),
        ]))];
        let pipeline = Pipeline::new(
            JobAggregator::new(sources, Duration::ZERO),
            Arc::new(KeywordJobScorer::default()),
            KitGenerator::new(None),
            config.output_dir.clone(),
            PipelineSettings {
                top_jobs: 10,
                kits_per_run: 1,
                min_score: 0,
            },
        );
        build_router(AppState::new(&config, Arc::new(pipeline)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path(), None), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "jobpilot");
        assert_eq!(body["sources"], json!(["static"]));
        assert_eq!(body["scorer"], "keyword");
        assert_eq!(body["generator"], "template");
    }

    #[tokio::test]
    async fn test_get_profile_and_completeness() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Some(&profile()));

        let (status, body) = send(app.clone(), get("/api/mobile/profile")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["personal"]["name"], "Ada Lovelace");

        let (status, body) = send(app, get("/api/mobile/profile/completeness")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["percentage"].as_u64().unwrap() < 100);
        assert!(body["sections"].as_array().unwrap().len() >= 7);
    }

    #[tokio::test]
    async fn test_search_scores_and_ranks() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            app(dir.path(), Some(&profile())),
            post_json("/api/mobile/jobs/search", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let jobs = body["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0]["score"].as_u64() >= jobs[1]["score"].as_u64());
        assert_eq!(body["sources"][0]["source"], "static");
        assert_eq!(body["sources"][0]["kind"], "html_board");
    }

    #[tokio::test]
    async fn test_search_keyword_override_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            app(dir.path(), Some(&profile())),
            post_json("/api/mobile/jobs/search", json!({"keywords": "engineer", "limit": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs"].as_array().unwrap().len(), 1);
        assert_eq!(body["unique"], 2);
    }

    #[tokio::test]
    async fn test_invalid_profile_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let mut invalid = profile();
        invalid.personal.email = "nope".into();
        let (status, body) = send(
            app(dir.path(), Some(&invalid)),
            post_json("/api/mobile/jobs/search", json!({})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_PROFILE");
    }

    #[tokio::test]
    async fn test_generate_kit_falls_back_to_template() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({
            "job": serde_json::to_value(job("Rust Engineer", "Acme")).unwrap(),
            "outreach_kind": "referral",
            "save": true,
        });
        let (status, body) = send(app(dir.path(), Some(&profile())), post_json("/api/mobile/kits", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kit"]["generator"], "template");
        assert_eq!(body["kit"]["company"], "Acme");
        assert!(body["score"]["total"].as_u64().unwrap() > 50);
        let saved = body["saved_to"].as_str().unwrap();
        assert!(Path::new(saved).join("kit.json").exists());
    }

    #[tokio::test]
    async fn test_generate_kit_rejects_blank_job() {
        let dir = tempfile::tempdir().unwrap();
        let body = json!({ "job": serde_json::to_value(job(" ", "Acme")).unwrap() });
        let (status, body) = send(app(dir.path(), Some(&profile())), post_json("/api/mobile/kits", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_automation_run_then_tracked_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Some(&profile()));

        let (status, summary) = send(app.clone(), post_json("/api/mobile/automation/run", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["jobs_matched"], 2);
        assert_eq!(summary["kits_generated"], 1);

        let (status, body) = send(app, get("/api/mobile/jobs")).await;
        assert_eq!(status, StatusCode::OK);
        let jobs = body["jobs"].as_array().unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0]["score"].as_u64() >= jobs[1]["score"].as_u64());
    }

    #[tokio::test]
    async fn test_user_id_without_supabase_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), Some(&profile()));

        let (status, body) = send(app.clone(), get("/api/mobile/profile?user_id=u1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(app.clone(), get("/api/mobile/jobs?user_id=u1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            app,
            post_json("/api/mobile/automation/run", json!({"user_id": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!dir.path().join("output").join("users").exists());
    }

    #[tokio::test]
    async fn test_update_profile_saves_valid_profile() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path(), None);

        let mut updated = profile();
        updated.personal.name = "Grace Hopper".into();
        let request = Request::builder()
            .method("PUT")
            .uri("/api/mobile/profile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&updated).unwrap()))
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["percentage"].is_u64());

        let (status, body) = send(app, get("/api/mobile/profile")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["personal"]["name"], "Grace Hopper");
    }

    #[tokio::test]
    async fn test_update_profile_rejects_invalid_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut invalid = profile();
        invalid.personal.email = "nope".into();
        let request = Request::builder()
            .method("PUT")
            .uri("/api/mobile/profile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&invalid).unwrap()))
            .unwrap();
        let (status, _) = send(app(dir.path(), None), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!dir.path().join("profile.json").exists());
    }

    #[tokio::test]
    async fn test_tracked_jobs_empty_before_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path(), None), get("/api/mobile/jobs")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs"], json!([]));
    }
}
