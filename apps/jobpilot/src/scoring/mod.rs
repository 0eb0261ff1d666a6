//! Job scoring: a pluggable scorer that rates a job against a profile.
//!
//! Default: `KeywordJobScorer` (additive point system, deterministic).
//! Optional: `LlmJobScorer` (blends an LLM fit rating with the keyword score).
//!
//! `AppState` and the pipeline hold an `Arc<dyn JobScorer>`, chosen at startup.

pub mod keyword;
pub mod llm;
pub mod skills;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::models::{Job, Profile};

pub use keyword::{KeywordJobScorer, ScoringWeights};
pub use llm::LlmJobScorer;

/// One rule that fired, with its signed contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReason {
    pub reason: String,
    pub points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: u8, // 0 – 100
    pub reasons: Vec<ScoreReason>,
    pub scorer_backend: String, // "keyword" | "llm+keyword"
}

impl ScoreBreakdown {
    #[cfg(test)]
    pub fn points_for(&self, reason_prefix: &str) -> Option<i32> {
        self.reasons
            .iter()
            .find(|r| r.reason.starts_with(reason_prefix))
            .map(|r| r.points)
    }
}

/// The scorer trait. Implement this to swap backends without touching the
/// pipeline or the handlers.
///
/// Scoring never fails: backends that call out fall back internally.
#[async_trait]
pub trait JobScorer: Send + Sync {
    async fn score(&self, profile: &Profile, job: &Job) -> ScoreBreakdown;

    fn backend(&self) -> &'static str;
}

/// Picks the scorer for this process.
pub fn build_scorer(config: &Config, llm: Option<&LlmClient>) -> Arc<dyn JobScorer> {
    match llm {
        Some(client) if config.enable_llm_scoring => {
            Arc::new(LlmJobScorer::new(client.clone(), ScoringWeights::default()))
        }
        _ => Arc::new(KeywordJobScorer::default()),
    }
}

/// Scores every job, stores the total on the job and sorts best first.
/// Ties keep the more recently posted job first.
pub async fn score_and_rank(scorer: &dyn JobScorer, profile: &Profile, jobs: Vec<Job>) -> Vec<Job> {
    let mut scored = Vec::with_capacity(jobs.len());
    for mut job in jobs {
        job.score = scorer.score(profile, &job).await.total;
        scored.push(job);
    }
    scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| b.posted_at.cmp(&a.posted_at)));
    scored
}
