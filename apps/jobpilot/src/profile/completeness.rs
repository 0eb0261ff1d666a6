use serde::{Deserialize, Serialize};

use crate::models::Profile;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionHealth {
    pub section: String,
    pub score: f64,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub overall_score: f64,
    /// `overall_score` as a whole percentage.
    pub percentage: u8,
    pub sections: Vec<SectionHealth>,
    pub missing_sections: Vec<String>,
}

const SECTION_WEIGHTS: &[(&str, f64)] = &[
    ("personal", 0.15),
    ("summary", 0.10),
    ("experience", 0.30),
    ("education", 0.10),
    ("skills", 0.20),
    ("preferences", 0.10),
    ("certifications", 0.05),
];

const TARGET_SKILL_COUNT: f64 = 8.0;

pub fn compute_completeness_report(profile: &Profile) -> CompletenessReport {
    let mut sections = Vec::with_capacity(SECTION_WEIGHTS.len());
    let mut missing_sections = Vec::new();
    let mut weighted_score_sum = 0.0;

    for (section, weight) in SECTION_WEIGHTS {
        let (score, recommendations) = score_section(profile, section);
        let score = score.clamp(0.0, 1.0);

        let status = match score {
            s if s >= 0.8 => SectionStatus::Strong,
            s if s >= 0.5 => SectionStatus::Moderate,
            s if s > 0.0 => SectionStatus::Weak,
            _ => SectionStatus::Missing,
        };
        if status == SectionStatus::Missing {
            missing_sections.push(section.to_string());
        }

        weighted_score_sum += score * weight;
        sections.push(SectionHealth {
            section: section.to_string(),
            score,
            status,
            recommendations,
        });
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
    let overall_score = (weighted_score_sum / total_weight).clamp(0.0, 1.0);

    CompletenessReport {
        overall_score,
        percentage: (overall_score * 100.0).round() as u8,
        sections,
        missing_sections,
    }
}

fn fraction(flags: &[bool]) -> f64 {
    flags.iter().filter(|f| **f).count() as f64 / flags.len() as f64
}

fn score_section(profile: &Profile, section: &str) -> (f64, Vec<String>) {
    let mut recs = Vec::new();
    let score = match section {
        "personal" => {
            let p = &profile.personal;
            let has_link = p.linkedin.is_some() || p.github.is_some() || p.website.is_some();
            if !has_link {
                recs.push("Add a LinkedIn, GitHub or personal site link".to_string());
            }
            if p.location.is_none() {
                recs.push("Add your location so boards can match nearby roles".to_string());
            }
            fraction(&[
                !p.name.trim().is_empty(),
                !p.email.trim().is_empty(),
                p.phone.is_some(),
                p.location.is_some(),
                has_link,
            ])
        }
        "summary" => {
            let words = profile.summary.split_whitespace().count();
            match words {
                0 => {
                    recs.push("Write a two or three sentence professional summary".to_string());
                    0.0
                }
                1..=19 => {
                    recs.push("Expand the summary to at least 20 words".to_string());
                    0.5
                }
                _ => 1.0,
            }
        }
        "experience" => {
            let n = profile.experience.len();
            if n == 0 {
                recs.push("Add at least one experience entry".to_string());
                0.0
            } else {
                let with_highlights = profile
                    .experience
                    .iter()
                    .filter(|e| !e.highlights.is_empty())
                    .count();
                if with_highlights < n {
                    recs.push(format!(
                        "{} experience entries have no highlights; add concrete results",
                        n - with_highlights
                    ));
                }
                if n < 2 {
                    recs.push("Add more experience entries to build a complete picture".to_string());
                }
                0.5 * (n.min(2) as f64 / 2.0) + 0.5 * (with_highlights as f64 / n as f64)
            }
        }
        "education" => {
            if profile.education.is_empty() {
                recs.push("Add your education".to_string());
                0.0
            } else {
                1.0
            }
        }
        "skills" => {
            let n = profile.skills.iter().filter(|s| !s.trim().is_empty()).count();
            if (n as f64) < TARGET_SKILL_COUNT {
                recs.push(format!("List at least {TARGET_SKILL_COUNT} skills (currently {n})"));
            }
            n as f64 / TARGET_SKILL_COUNT
        }
        "preferences" => {
            let prefs = &profile.preferences;
            let flags = [
                !prefs.target_titles.is_empty() || !prefs.keywords.is_empty(),
                !prefs.locations.is_empty() || prefs.remote_only,
                prefs.min_salary.is_some(),
                prefs.seniority.is_some(),
            ];
            if !flags[0] {
                recs.push("Add target titles or keywords; searches depend on them".to_string());
            }
            if !flags[2] {
                recs.push("Set a minimum salary to enable salary scoring".to_string());
            }
            fraction(&flags)
        }
        "certifications" => {
            if profile.certifications.is_empty() {
                0.0
            } else {
                1.0
            }
        }
        _ => 0.0,
    };
    (score, recs)
}
