use serde::{Deserialize, Serialize};

/// Candidate profile. Loaded once per run and treated as read-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub personal: PersonalInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub graduation_year: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub title: String,
    pub start: Option<String>,
    /// None for the current position.
    pub end: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// What the candidate is looking for. Drives query building, filtering and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub target_titles: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub remote_only: bool,
    pub min_salary: Option<f64>,
    /// "intern", "entry", "junior", "mid", "senior", "lead", "staff", "principal"
    pub seniority: Option<String>,
    #[serde(default)]
    pub excluded_companies: Vec<String>,
    #[serde(default)]
    pub excluded_keywords: Vec<String>,
    #[serde(default = "default_results_per_source")]
    pub results_per_source: usize,
    #[serde(default)]
    pub email_digest: bool,
}

fn default_results_per_source() -> usize {
    25
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            target_titles: Vec::new(),
            keywords: Vec::new(),
            locations: Vec::new(),
            remote_only: false,
            min_salary: None,
            seniority: None,
            excluded_companies: Vec::new(),
            excluded_keywords: Vec::new(),
            results_per_source: default_results_per_source(),
            email_digest: false,
        }
    }
}

impl Profile {
    pub fn display_name(&self) -> &str {
        if self.personal.name.trim().is_empty() {
            "Candidate"
        } else {
            self.personal.name.trim()
        }
    }

    /// Most recent role title, used as a fallback headline.
    pub fn current_title(&self) -> Option<&str> {
        self.experience
            .iter()
            .find(|e| e.end.is_none())
            .or_else(|| self.experience.first())
            .map(|e| e.title.as_str())
    }

    /// Lowercased skills, for case-insensitive comparisons.
    pub fn skills_lower(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.trim().to_lowercase()).collect()
    }

    /// Plain-text rendering handed to LLM prompts.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Name: {}\n", self.display_name()));
        if let Some(location) = &self.personal.location {
            out.push_str(&format!("Location: {location}\n"));
        }
        if !self.summary.is_empty() {
            out.push_str(&format!("Summary: {}\n", self.summary));
        }
        if !self.skills.is_empty() {
            out.push_str(&format!("Skills: {}\n", self.skills.join(", ")));
        }
        if !self.experience.is_empty() {
            out.push_str("Experience:\n");
            for exp in &self.experience {
                out.push_str(&format!(
                    "- {} at {} ({} – {})\n",
                    exp.title,
                    exp.company,
                    exp.start.as_deref().unwrap_or("?"),
                    exp.end.as_deref().unwrap_or("present")
                ));
                for highlight in &exp.highlights {
                    out.push_str(&format!("  * {highlight}\n"));
                }
            }
        }
        if !self.education.is_empty() {
            out.push_str("Education:\n");
            for edu in &self.education {
                out.push_str(&format!("- {} — {}\n", edu.degree, edu.institution));
            }
        }
        if !self.certifications.is_empty() {
            out.push_str(&format!("Certifications: {}\n", self.certifications.join(", ")));
        }
        out
    }
}
