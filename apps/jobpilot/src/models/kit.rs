use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generated application material for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationKit {
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub job_url: String,
    pub resume: String,
    pub cover_letter: String,
    pub outreach_message: String,
    pub learning_path: String,
    /// `anthropic:<model>`, `openai:<model>` or `template`.
    pub generator: String,
    pub generated_at: DateTime<Utc>,
}

impl ApplicationKit {
    pub fn used_fallback(&self) -> bool {
        self.generator == "template"
    }
}
