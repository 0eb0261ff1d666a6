//! Tone calibration: detects a posting's register and maps it to verb sets.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTone {
    Startup,
    Enterprise,
    Research,
    Product,
}

impl JobTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobTone::Startup => "startup",
            JobTone::Enterprise => "enterprise",
            JobTone::Research => "research",
            JobTone::Product => "product",
        }
    }
}

const STARTUP_SIGNALS: &[&str] = &[
    "startup",
    "start-up",
    "fast-paced",
    "seed",
    "series a",
    "series b",
    "founding",
    "equity",
    "scrappy",
    "wear many hats",
];
const ENTERPRISE_SIGNALS: &[&str] = &[
    "fortune 500",
    "enterprise",
    "stakeholders",
    "cross-functional",
    "compliance",
    "global organization",
    "governance",
];
const RESEARCH_SIGNALS: &[&str] = &[
    "research",
    "phd",
    "publications",
    "publish",
    "laboratory",
    "experiments",
    "novel",
];
const PRODUCT_SIGNALS: &[&str] = &[
    "customers",
    "user experience",
    "product-minded",
    "ship",
    "roadmap",
    "end users",
];

/// Picks the tone whose signal words appear most often in the posting.
/// Ties and postings with no signals fall back to `Product`.
pub fn detect_tone(description: &str) -> JobTone {
    let lower = description.to_lowercase();
    let hits = |signals: &[&str]| signals.iter().filter(|s| lower.contains(*s)).count();

    let scored = [
        (JobTone::Startup, hits(STARTUP_SIGNALS)),
        (JobTone::Enterprise, hits(ENTERPRISE_SIGNALS)),
        (JobTone::Research, hits(RESEARCH_SIGNALS)),
        (JobTone::Product, hits(PRODUCT_SIGNALS)),
    ];

    let best = scored.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if best == 0 {
        return JobTone::Product;
    }
    let leaders: Vec<JobTone> = scored.iter().filter(|(_, n)| *n == best).map(|(t, _)| *t).collect();
    if leaders.len() == 1 {
        leaders[0]
    } else {
        JobTone::Product
    }
}

/// Verb sets and phrasing calibrated to a specific tone.
#[derive(Debug, Clone)]
pub struct ToneExamples {
    pub strong_verbs: Vec<&'static str>,
    pub opening: &'static str,
    pub avoid_verbs: Vec<&'static str>,
}

pub fn get_tone_examples(tone: JobTone) -> ToneExamples {
    match tone {
        JobTone::Startup => ToneExamples {
            strong_verbs: vec!["Built", "Shipped", "Owned", "Launched", "Drove", "Scaled"],
            opening: "I'm excited by the chance to build",
            avoid_verbs: vec!["assisted", "participated in", "was responsible for"],
        },
        JobTone::Enterprise => ToneExamples {
            strong_verbs: vec![
                "Partnered with",
                "Delivered",
                "Collaborated on",
                "Improved",
                "Standardized",
                "Enabled",
            ],
            opening: "I am writing to express my interest in",
            avoid_verbs: vec!["hacked", "crushed", "moved fast"],
        },
        JobTone::Research => ToneExamples {
            strong_verbs: vec![
                "Investigated",
                "Designed and evaluated",
                "Published",
                "Analyzed",
                "Proposed",
                "Benchmarked",
            ],
            opening: "I am drawn to the research questions behind",
            avoid_verbs: vec!["shipped", "disrupted", "crushed"],
        },
        JobTone::Product => ToneExamples {
            strong_verbs: vec![
                "Shipped",
                "Delivered",
                "Improved",
                "Reduced friction for",
                "Launched",
                "Measured",
            ],
            opening: "I'd love to help shape",
            avoid_verbs: vec!["investigated", "theorized"],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_startup() {
        let jd = "Join our seed-stage startup. Fast-paced, founding team, meaningful equity.";
        assert_eq!(detect_tone(jd), JobTone::Startup);
    }

    #[test]
    fn test_detects_research() {
        let jd = "PhD preferred. You will run experiments and publish novel results.";
        assert_eq!(detect_tone(jd), JobTone::Research);
    }

    #[test]
    fn test_detects_enterprise() {
        let jd = "Work with stakeholders across a global organization to meet compliance needs.";
        assert_eq!(detect_tone(jd), JobTone::Enterprise);
    }

    #[test]
    fn test_no_signal_defaults_to_product() {
        assert_eq!(detect_tone("Write code."), JobTone::Product);
    }

    #[test]
    fn test_research_tone_avoids_shipping_language() {
        let t = get_tone_examples(JobTone::Research);
        assert!(t.strong_verbs.contains(&"Published"));
        assert!(t.avoid_verbs.contains(&"shipped"));
    }

    #[test]
    fn test_startup_tone_prefers_ownership() {
        let t = get_tone_examples(JobTone::Startup);
        assert!(t.strong_verbs.contains(&"Owned"));
        assert!(t.avoid_verbs.contains(&"assisted"));
    }
}
