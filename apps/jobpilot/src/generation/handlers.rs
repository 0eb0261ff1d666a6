//! Axum route handlers for the kit generation API.

use axum::{extract::State, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::OutreachKind;
use crate::models::{ApplicationKit, Job};
use crate::scoring::ScoreBreakdown;
use crate::storage::ApplicationRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KitRequest {
    pub user_id: Option<String>,
    pub job: Job,
    #[serde(default)]
    pub outreach_kind: OutreachKind,
    /// Also write the kit folder and an `applications.csv` row.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct KitResponse {
    pub kit: ApplicationKit,
    pub score: ScoreBreakdown,
    pub saved_to: Option<String>,
}

/// POST /api/mobile/kits
///
/// Scores the job against the caller's profile and generates the full kit.
/// Falls back to templates when the LLM is unavailable.
pub async fn handle_generate_kit(
    State(state): State<AppState>,
    Json(request): Json<KitRequest>,
) -> Result<Json<KitResponse>, AppError> {
    if request.job.title.trim().is_empty() || request.job.company.trim().is_empty() {
        return Err(AppError::Validation(
            "job.title and job.company cannot be empty".to_string(),
        ));
    }

    let user_id = request.user_id.as_deref();
    let profile = state.load_profile(user_id).await?;

    let mut job = request.job;
    let score = state.pipeline.scorer().score(&profile, &job).await;
    job.score = score.total;

    let kit = state
        .pipeline
        .generator()
        .generate_kit_for(&profile, &job, request.outreach_kind)
        .await;

    let saved_to = if request.save {
        let storage = state.pipeline.storage(user_id);
        let path = storage.kits.save(&kit, Local::now().date_naive())?;
        storage
            .applications
            .append(&ApplicationRecord::generated(&kit, job.score, &path))?;
        info!("Saved kit for '{}' to {}", kit.job_title, path.display());
        Some(path.display().to_string())
    } else {
        None
    };

    Ok(Json(KitResponse {
        kit,
        score,
        saved_to,
    }))
}
