//! Axum route handlers for job search, tracked jobs and on-demand runs.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::aggregator::SourceReport;
use crate::automation::{RunSummary, SearchOverrides};
use crate::errors::AppError;
use crate::models::Job;
use crate::profile::handlers::UserIdQuery;
use crate::state::AppState;
use crate::storage::TrackedJob;

const DEFAULT_SEARCH_LIMIT: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub overrides: SearchOverrides,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub jobs: Vec<Job>,
    pub total_before_dedup: usize,
    pub unique: usize,
    pub after_filters: usize,
    pub sources: Vec<SourceReport>,
}

#[derive(Debug, Serialize)]
pub struct TrackedJobsResponse {
    pub jobs: Vec<TrackedJob>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    pub user_id: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/mobile/jobs/search
///
/// Live search with optional overrides. Results are scored and ranked but
/// not persisted.
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let profile = state.load_profile(request.user_id.as_deref()).await?;

    let queries = request.overrides.queries(&profile);
    if queries.is_empty() {
        return Err(AppError::Validation(
            "No search terms: set keywords or add target titles to the profile".to_string(),
        ));
    }

    let mut outcome = state.pipeline.search(&profile, &queries).await;
    outcome
        .jobs
        .truncate(request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1));

    Ok(Json(SearchResponse {
        jobs: outcome.jobs,
        total_before_dedup: outcome.total_before_dedup,
        unique: outcome.unique,
        after_filters: outcome.after_filters,
        sources: outcome.sources,
    }))
}

/// GET /api/mobile/jobs
///
/// Every job tracked so far, best score first.
pub async fn handle_tracked_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<TrackedJobsResponse>, AppError> {
    let user_id = params.user_id.as_deref();
    state.check_user(user_id)?;
    let storage = state.pipeline.storage(user_id);
    let mut jobs = storage.jobs.load()?;
    jobs.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.discovered_at.cmp(&a.discovered_at))
    });
    Ok(Json(TrackedJobsResponse { jobs }))
}

/// POST /api/mobile/automation/run
///
/// Runs the full pipeline for one profile and waits for it to finish.
pub async fn handle_run_automation(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunSummary>, AppError> {
    let user_id = request.user_id.as_deref();
    let profile = state.load_profile(user_id).await?;
    let summary = state.pipeline.run_for_profile(&profile, user_id).await;
    Ok(Json(summary))
}
