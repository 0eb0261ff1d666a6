use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::llm_client::prompts::{fill, JSON_ONLY_SYSTEM};
use crate::llm_client::LlmClient;
use crate::models::{Job, Profile};
use crate::scoring::keyword::{KeywordJobScorer, ScoringWeights};
use crate::scoring::{JobScorer, ScoreBreakdown, ScoreReason};
use crate::sources::text::truncate_chars;

const FIT_PROMPT: &str = r#"Rate how well this candidate fits this job on a 0-100 scale.

CANDIDATE:
{profile}

JOB: {title} at {company} ({location})
{description}

Return JSON: {"score": <integer 0-100>, "reason": "<one sentence>"}"#;

const MAX_DESCRIPTION_CHARS: usize = 4000;

#[derive(Debug, Deserialize)]
struct LlmFit {
    score: f64,
    #[serde(default)]
    reason: String,
}

/// Semantic scorer: averages an LLM fit rating with the keyword score.
/// Any LLM failure yields the plain keyword breakdown.
pub struct LlmJobScorer {
    llm: LlmClient,
    keyword: KeywordJobScorer,
}

impl LlmJobScorer {
    pub fn new(llm: LlmClient, weights: ScoringWeights) -> Self {
        Self {
            llm,
            keyword: KeywordJobScorer::new(weights),
        }
    }
}

#[async_trait]
impl JobScorer for LlmJobScorer {
    async fn score(&self, profile: &Profile, job: &Job) -> ScoreBreakdown {
        let mut breakdown = self.keyword.breakdown(profile, job);

        let profile_text = profile.to_prompt_text();
        let description = truncate_chars(&job.description, MAX_DESCRIPTION_CHARS);
        let prompt = fill(
            FIT_PROMPT,
            &[
                ("profile", profile_text.as_str()),
                ("title", job.title.as_str()),
                ("company", job.company.as_str()),
                ("location", job.location.as_str()),
                ("description", description.as_str()),
            ],
        );

        let fit: LlmFit = match self.llm.call_json(&prompt, JSON_ONLY_SYSTEM).await {
            Ok(fit) => fit,
            Err(e) => {
                warn!("LLM scoring failed for '{}', using keyword score: {e}", job.title);
                return breakdown;
            }
        };

        let llm_score = fit.score.clamp(0.0, 100.0).round() as i32;
        let keyword_score = breakdown.total as i32;
        let blended = ((llm_score + keyword_score) as f64 / 2.0).round() as i32;

        breakdown.reasons.push(ScoreReason {
            reason: format!("llm fit {llm_score}: {}", fit.reason),
            points: blended - keyword_score,
        });
        breakdown.total = blended.clamp(0, 100) as u8;
        breakdown.scorer_backend = "llm+keyword".to_string();
        breakdown
    }

    fn backend(&self) -> &'static str {
        "llm+keyword"
    }
}
