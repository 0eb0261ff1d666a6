//! Application kit generation.
//!
//! Each document is one LLM call. When no LLM is configured, or a call fails,
//! the static template from `templates.rs` is used instead and the kit is
//! labelled `template`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generation::prompts::{
    COVER_LETTER_PROMPT_TEMPLATE, LEARNING_PATH_PROMPT_TEMPLATE, OUTREACH_PROMPT_TEMPLATE,
    RESUME_PROMPT_TEMPLATE,
};
use crate::generation::templates;
use crate::generation::tone::{detect_tone, get_tone_examples};
use crate::llm_client::prompts::{fill, CAREER_WRITER_SYSTEM, GROUNDING_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::{ApplicationKit, Job, Profile};
use crate::scoring::skills::skill_gap;
use crate::sources::text::truncate_chars;

pub const TEMPLATE_GENERATOR: &str = "template";

/// Upper bound for outreach messages.
pub const OUTREACH_MAX_WORDS: usize = 120;

const MAX_DESCRIPTION_CHARS: usize = 6000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachKind {
    #[default]
    Recruiter,
    HiringManager,
    Referral,
}

impl OutreachKind {
    fn audience(&self) -> &'static str {
        match self {
            OutreachKind::Recruiter => "a recruiter at the company (LinkedIn message)",
            OutreachKind::HiringManager => "the hiring manager for the role (short email)",
            OutreachKind::Referral => "an acquaintance who works at the company, asking for a referral",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OutreachKind::Recruiter => "recruiter outreach",
            OutreachKind::HiringManager => "hiring manager outreach",
            OutreachKind::Referral => "referral request",
        }
    }
}

/// A generated document and whether it came from the fallback template.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    pub text: String,
    pub fell_back: bool,
}

impl Generated {
    fn llm(text: String) -> Self {
        Self { text, fell_back: false }
    }

    fn template(text: String) -> Self {
        Self { text, fell_back: true }
    }
}

#[derive(Clone)]
pub struct KitGenerator {
    llm: Option<LlmClient>,
}

impl KitGenerator {
    pub fn new(llm: Option<LlmClient>) -> Self {
        Self { llm }
    }

    /// `"<provider>:<model>"`, or `template` when no LLM is configured.
    pub fn label(&self) -> String {
        self.llm
            .as_ref()
            .map(LlmClient::label)
            .unwrap_or_else(|| TEMPLATE_GENERATOR.to_string())
    }

    /// Runs one completion. `None` means "use the template".
    async fn complete(&self, what: &str, prompt: &str) -> Option<String> {
        let llm = self.llm.as_ref()?;
        match llm.call(prompt, CAREER_WRITER_SYSTEM).await {
            Ok(response) => Some(response.text.trim().to_string()),
            Err(e) => {
                warn!("LLM {what} generation failed, using template: {e}");
                None
            }
        }
    }

    pub async fn resume(&self, profile: &Profile, job: &Job) -> Generated {
        let profile_text = profile.to_prompt_text();
        let description = truncate_chars(&job.description, MAX_DESCRIPTION_CHARS);
        let prompt = fill(
            RESUME_PROMPT_TEMPLATE,
            &[
                ("profile", profile_text.as_str()),
                ("title", job.title.as_str()),
                ("company", job.company.as_str()),
                ("location", job.location.as_str()),
                ("description", description.as_str()),
                ("grounding", GROUNDING_INSTRUCTION),
            ],
        );

        match self.complete("resume", &prompt).await {
            Some(text) => Generated::llm(text),
            None => Generated::template(templates::resume(profile, job)),
        }
    }

    pub async fn cover_letter(&self, profile: &Profile, job: &Job) -> Generated {
        let tone = detect_tone(&job.description);
        let examples = get_tone_examples(tone);
        let profile_text = profile.to_prompt_text();
        let description = truncate_chars(&job.description, MAX_DESCRIPTION_CHARS);
        let strong = examples.strong_verbs.join(", ");
        let avoid = examples.avoid_verbs.join(", ");
        let prompt = fill(
            COVER_LETTER_PROMPT_TEMPLATE,
            &[
                ("profile", profile_text.as_str()),
                ("title", job.title.as_str()),
                ("company", job.company.as_str()),
                ("location", job.location.as_str()),
                ("description", description.as_str()),
                ("tone", tone.as_str()),
                ("strong_verbs", strong.as_str()),
                ("avoid_verbs", avoid.as_str()),
                ("opening", examples.opening),
                ("grounding", GROUNDING_INSTRUCTION),
            ],
        );

        match self.complete("cover letter", &prompt).await {
            Some(text) => Generated::llm(text),
            None => Generated::template(templates::cover_letter(profile, job, tone)),
        }
    }

    pub async fn outreach(&self, profile: &Profile, job: &Job, kind: OutreachKind) -> Generated {
        let profile_text = profile.to_prompt_text();
        let max_words = OUTREACH_MAX_WORDS.to_string();
        let prompt = fill(
            OUTREACH_PROMPT_TEMPLATE,
            &[
                ("kind", kind.label()),
                ("profile", profile_text.as_str()),
                ("title", job.title.as_str()),
                ("company", job.company.as_str()),
                ("audience", kind.audience()),
                ("max_words", max_words.as_str()),
                ("grounding", GROUNDING_INSTRUCTION),
            ],
        );

        match self.complete("outreach", &prompt).await {
            Some(text) => Generated::llm(limit_words(&text, OUTREACH_MAX_WORDS)),
            None => Generated::template(templates::outreach(profile, job, kind)),
        }
    }

    /// Plan built around the skill gap. An empty gap needs no LLM call.
    pub async fn learning_path(&self, profile: &Profile, job: &Job) -> Generated {
        let gap = skill_gap(profile, job);
        if gap.is_empty() {
            return Generated::llm(templates::no_gap_plan(job));
        }

        let skills = profile.skills.join(", ");
        let gap_list = gap.join(", ");
        let prompt = fill(
            LEARNING_PATH_PROMPT_TEMPLATE,
            &[
                ("skills", skills.as_str()),
                ("title", job.title.as_str()),
                ("company", job.company.as_str()),
                ("gap", gap_list.as_str()),
            ],
        );

        match self.complete("learning path", &prompt).await {
            Some(text) => Generated::llm(text),
            None => Generated::template(templates::learning_path(job, &gap)),
        }
    }

    /// All four documents for one job, with a recruiter outreach message.
    pub async fn generate_kit(&self, profile: &Profile, job: &Job) -> ApplicationKit {
        self.generate_kit_for(profile, job, OutreachKind::Recruiter).await
    }

    pub async fn generate_kit_for(&self, profile: &Profile, job: &Job, kind: OutreachKind) -> ApplicationKit {
        info!("Generating application kit for '{}' at {}", job.title, job.company);

        let resume = self.resume(profile, job).await;
        let cover_letter = self.cover_letter(profile, job).await;
        let outreach = self.outreach(profile, job, kind).await;
        let learning_path = self.learning_path(profile, job).await;

        let fell_back = self.llm.is_none()
            || [&resume, &cover_letter, &outreach, &learning_path]
                .iter()
                .any(|g| g.fell_back);

        ApplicationKit {
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            company: job.company.clone(),
            job_url: job.url.clone(),
            resume: resume.text,
            cover_letter: cover_letter.text,
            outreach_message: outreach.text,
            learning_path: learning_path.text,
            generator: if fell_back {
                TEMPLATE_GENERATOR.to_string()
            } else {
                self.label()
            },
            generated_at: Utc::now(),
        }
    }
}

/// Truncates to `max` words, keeping the original spacing of what remains.
pub fn limit_words(text: &str, max: usize) -> String {
    let mut count = 0;
    let mut in_word = false;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            count += 1;
            if count > max {
                return text[..i].trim_end().to_string();
            }
        }
    }
    text.to_string()
}
