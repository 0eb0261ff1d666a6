//! Candidate profile management: file IO, validation, completeness and the
//! source a run reads its profile from.

pub mod completeness;
pub mod handlers;
pub mod loader;
pub mod validation;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Profile;
use crate::supabase::{SupabaseClient, SupabaseError};

pub use completeness::{compute_completeness_report, CompletenessReport};
pub use loader::load_from_file;
pub use validation::validate;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed profile JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Profile is invalid: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Supabase(#[from] SupabaseError),
}

/// Where a run reads its profile from.
#[derive(Clone)]
pub enum ProfileSource {
    File(PathBuf),
    Supabase(SupabaseClient),
}

impl ProfileSource {
    /// Loads and validates a profile. Supabase profiles are keyed by user id.
    pub async fn load(&self, user_id: Option<&str>) -> Result<Profile, ProfileError> {
        let profile = self.fetch(user_id).await?;
        validate(&profile)?;
        Ok(profile)
    }

    /// Loads a profile without validating it.
    pub async fn fetch(&self, user_id: Option<&str>) -> Result<Profile, ProfileError> {
        let profile = match self {
            ProfileSource::File(path) => load_from_file(path)?,
            ProfileSource::Supabase(client) => {
                let user_id = user_id
                    .ok_or_else(|| ProfileError::NotFound("a user id is required".to_string()))?;
                client
                    .profile(user_id)
                    .await?
                    .ok_or_else(|| ProfileError::NotFound(format!("user {user_id}")))?
            }
        };
        Ok(profile)
    }

    pub fn describe(&self) -> String {
        match self {
            ProfileSource::File(path) => format!("file {}", path.display()),
            ProfileSource::Supabase(_) => "supabase".to_string(),
        }
    }
}
