use std::path::PathBuf;
use std::sync::Arc;

use crate::automation::Pipeline;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::Profile;
use crate::profile::ProfileSource;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Search, scoring, generation and persistence, shared with the scheduler.
    pub pipeline: Arc<Pipeline>,
    /// Single-user profile, used when a request carries no user id.
    pub profile_path: PathBuf,
}

impl AppState {
    pub fn new(config: &Config, pipeline: Arc<Pipeline>) -> Self {
        Self {
            profile_path: config.profile_path.clone(),
            pipeline,
        }
    }

    /// A user id only means something in multi-user mode. Without Supabase it
    /// is rejected rather than silently mapped onto the local profile.
    pub fn check_user(&self, user_id: Option<&str>) -> Result<(), AppError> {
        match user_id {
            Some(id) if self.pipeline.supabase().is_none() => Err(AppError::Validation(format!(
                "user_id '{id}' given but multi-user mode is not configured"
            ))),
            _ => Ok(()),
        }
    }

    /// Supabase when a user id is given, otherwise the local profile file.
    pub fn profile_source(&self, user_id: Option<&str>) -> Result<ProfileSource, AppError> {
        self.check_user(user_id)?;
        Ok(match (user_id, self.pipeline.supabase()) {
            (Some(_), Some(client)) => ProfileSource::Supabase(client.clone()),
            _ => ProfileSource::File(self.profile_path.clone()),
        })
    }

    /// Loads and validates the profile a request refers to.
    pub async fn load_profile(&self, user_id: Option<&str>) -> Result<Profile, AppError> {
        Ok(self.profile_source(user_id)?.load(user_id).await?)
    }
}
