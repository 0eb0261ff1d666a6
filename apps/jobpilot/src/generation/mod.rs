// Application kit generation: tailored resume, cover letter, outreach
// message and learning path for one job.
// All LLM calls go through llm_client; templates.rs covers every fallback.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod templates;
pub mod tone;

pub use generator::{KitGenerator, OutreachKind};
