use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::email::EmailError;
use crate::llm_client::LlmError;
use crate::profile::ProfileError;
use crate::sources::SourceError;
use crate::storage::StorageError;
use crate::supabase::SupabaseError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job source error: {0}")]
    Source(#[from] SourceError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Profile(ProfileError::Invalid(problems)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_PROFILE",
                problems.join("; "),
            ),
            AppError::Profile(ProfileError::NotFound(what)) => (
                StatusCode::NOT_FOUND,
                "PROFILE_NOT_FOUND",
                format!("Profile not found: {what}"),
            ),
            AppError::Profile(e) => {
                tracing::error!("Profile error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROFILE_ERROR",
                    "The profile could not be loaded".to_string(),
                )
            }
            AppError::Source(e) => {
                tracing::error!("Job source error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SOURCE_ERROR",
                    "A job board request failed".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Email(e) => {
                tracing::error!("Email error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EMAIL_ERROR",
                    "The email could not be delivered".to_string(),
                )
            }
            AppError::Supabase(e) => {
                tracing::error!("Supabase error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SUPABASE_ERROR",
                    "A database request failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
