use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Job, Profile};
use crate::scoring::skills::contains_term;
use crate::scoring::{JobScorer, ScoreBreakdown, ScoreReason};

const SENIOR_LEVELS: &[&str] = &["senior", "lead", "staff", "principal"];
const JUNIOR_LEVELS: &[&str] = &["intern", "entry", "junior"];

/// Point values for every rule. `Default` holds the tuned constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub base: i32,
    pub title_match: i32,
    pub keyword_in_title: i32,
    pub keyword_in_title_cap: i32,
    pub keyword_in_description: i32,
    pub keyword_in_description_cap: i32,
    pub skill_in_description: i32,
    pub skill_cap: i32,
    pub seniority_match: i32,
    pub seniority_mismatch: i32,
    pub internship_penalty: i32,
    pub salary_meets_minimum: i32,
    pub salary_below_minimum: i32,
    pub salary_well_above: i32,
    pub remote_match: i32,
    pub location_match: i32,
    pub excluded_keyword_penalty: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 50,
            title_match: 15,
            keyword_in_title: 8,
            keyword_in_title_cap: 24,
            keyword_in_description: 3,
            keyword_in_description_cap: 15,
            skill_in_description: 2,
            skill_cap: 10,
            seniority_match: 10,
            seniority_mismatch: -15,
            internship_penalty: -20,
            salary_meets_minimum: 10,
            salary_below_minimum: -20,
            salary_well_above: 5,
            remote_match: 5,
            location_match: 5,
            excluded_keyword_penalty: -30,
        }
    }
}

/// Additive point scorer. Fast, deterministic, no network.
///
/// Starts from `base`, applies each rule that fires, then clamps to 0..=100.
/// Every rule that fires is recorded in the breakdown.
#[derive(Debug, Clone, Default)]
pub struct KeywordJobScorer {
    weights: ScoringWeights,
}

impl KeywordJobScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn breakdown(&self, profile: &Profile, job: &Job) -> ScoreBreakdown {
        let w = &self.weights;
        let prefs = &profile.preferences;
        let title = job.title.to_lowercase();
        let description = job.description.to_lowercase();

        let mut reasons = vec![ScoreReason {
            reason: "base".to_string(),
            points: w.base,
        }];
        let mut add = |reason: String, points: i32| {
            if points != 0 {
                reasons.push(ScoreReason { reason, points });
            }
        };

        // Target title
        if let Some(target) = prefs
            .target_titles
            .iter()
            .map(|t| t.trim().to_lowercase())
            .find(|t| !t.is_empty() && title.contains(t.as_str()))
        {
            add(format!("title matches target '{target}'"), w.title_match);
        }

        // Keywords
        let keywords: Vec<String> = prefs
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        let in_title = keywords.iter().filter(|k| contains_term(&title, k)).count() as i32;
        add(
            format!("{in_title} keyword(s) in title"),
            (in_title * w.keyword_in_title).min(w.keyword_in_title_cap),
        );
        let in_description = keywords.iter().filter(|k| contains_term(&description, k)).count() as i32;
        add(
            format!("{in_description} keyword(s) in description"),
            (in_description * w.keyword_in_description).min(w.keyword_in_description_cap),
        );

        // Skills
        let skills = profile
            .skills_lower()
            .into_iter()
            .filter(|s| !s.is_empty() && contains_term(&description, s))
            .count() as i32;
        add(
            format!("{skills} profile skill(s) in description"),
            (skills * w.skill_in_description).min(w.skill_cap),
        );

        // Seniority. Internships are penalised unless the candidate is an
        // intern or entry level, including when no seniority is set.
        let wanted = prefs.seniority.as_deref().map(normalize_level);
        match (job_level(&title), wanted) {
            (Some("intern"), wanted) if !matches!(wanted, Some("intern" | "junior")) => {
                add("internship role".to_string(), w.internship_penalty);
            }
            (Some(level), Some(wanted)) if SENIOR_LEVELS.contains(&level) && JUNIOR_LEVELS.contains(&wanted) => {
                add(format!("{level} role for {wanted} candidate"), w.seniority_mismatch);
            }
            (Some(level), Some(wanted)) if level == wanted => {
                add(format!("seniority matches '{level}'"), w.seniority_match);
            }
            _ => {}
        }

        // Salary
        if let Some(floor) = prefs.min_salary.filter(|f| *f > 0.0) {
            match job.salary_max {
                Some(max) if max >= floor => add("salary meets minimum".to_string(), w.salary_meets_minimum),
                Some(_) => add("salary below minimum".to_string(), w.salary_below_minimum),
                None => {}
            }
            if job.salary_min.is_some_and(|min| min >= floor * 1.2) {
                add("salary well above minimum".to_string(), w.salary_well_above);
            }
        }

        // Location
        let wants_remote = prefs.remote_only
            || prefs.locations.iter().any(|l| l.trim().eq_ignore_ascii_case("remote"));
        if wants_remote && job.remote {
            add("remote role".to_string(), w.remote_match);
        }
        let location = job.location.to_lowercase();
        if let Some(place) = prefs
            .locations
            .iter()
            .map(|l| l.trim().to_lowercase())
            .find(|l| !l.is_empty() && l != "remote" && location.contains(l.as_str()))
        {
            add(format!("location matches '{place}'"), w.location_match);
        }

        // Exclusions
        if let Some(excluded) = prefs
            .excluded_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .find(|k| !k.is_empty() && contains_term(&description, k))
        {
            add(format!("excluded keyword '{excluded}'"), w.excluded_keyword_penalty);
        }

        let sum: i32 = reasons.iter().map(|r| r.points).sum();
        ScoreBreakdown {
            total: sum.clamp(0, 100) as u8,
            reasons,
            scorer_backend: "keyword".to_string(),
        }
    }
}

#[async_trait]
impl JobScorer for KeywordJobScorer {
    async fn score(&self, profile: &Profile, job: &Job) -> ScoreBreakdown {
        self.breakdown(profile, job)
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

/// Maps profile spellings onto the levels `job_level` reports.
fn normalize_level(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "intern" | "internship" => "intern",
        "entry" | "entry-level" | "entry level" | "junior" | "jr" | "graduate" => "junior",
        "senior" | "sr" => "senior",
        "lead" => "lead",
        "staff" => "staff",
        "principal" => "principal",
        _ => "mid",
    }
}

/// Seniority implied by a lowercase job title, if any.
fn job_level(title: &str) -> Option<&'static str> {
    if contains_term(title, "intern") || contains_term(title, "internship") {
        Some("intern")
    } else if contains_term(title, "principal") {
        Some("principal")
    } else if contains_term(title, "staff") {
        Some("staff")
    } else if contains_term(title, "lead") {
        Some("lead")
    } else if contains_term(title, "senior") || contains_term(title, "sr") {
        Some("senior")
    } else if ["junior", "jr", "entry", "graduate"].iter().any(|t| contains_term(title, t)) {
        Some("junior")
    } else {
        None
    }
}
