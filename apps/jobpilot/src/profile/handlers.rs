//! Axum route handlers for the profile endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::Profile;
use crate::profile::{compute_completeness_report, loader::save_to_file, validate, CompletenessReport};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

/// GET /api/mobile/profile
///
/// Returns the stored profile as-is. Validation problems are reported by the
/// completeness endpoint, not here, so an incomplete profile can still be edited.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Profile>, AppError> {
    let user_id = params.user_id.as_deref();
    let profile = state.profile_source(user_id)?.fetch(user_id).await?;
    Ok(Json(profile))
}

/// GET /api/mobile/profile/completeness
pub async fn handle_profile_completeness(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CompletenessReport>, AppError> {
    let user_id = params.user_id.as_deref();
    let profile = state.profile_source(user_id)?.fetch(user_id).await?;
    Ok(Json(compute_completeness_report(&profile)))
}

/// PUT /api/mobile/profile
///
/// Replaces the local profile. Only valid profiles are written.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(profile): Json<Profile>,
) -> Result<Json<CompletenessReport>, AppError> {
    if params.user_id.is_some() {
        return Err(AppError::Validation(
            "profiles of multi-user accounts are edited in Supabase".to_string(),
        ));
    }
    validate(&profile)?;
    save_to_file(&state.profile_path, &profile)?;
    info!("Profile saved to {}", state.profile_path.display());
    Ok(Json(compute_completeness_report(&profile)))
}
