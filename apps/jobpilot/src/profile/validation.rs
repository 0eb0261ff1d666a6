use crate::models::Profile;
use crate::profile::ProfileError;

/// Checks the fields a run cannot do without. Every problem is reported,
/// not just the first.
pub fn validate(profile: &Profile) -> Result<(), ProfileError> {
    let mut problems = Vec::new();

    if profile.personal.name.trim().is_empty() {
        problems.push("personal.name is required".to_string());
    }
    let email = profile.personal.email.trim();
    if email.is_empty() {
        problems.push("personal.email is required".to_string());
    } else if !email.contains('@') {
        problems.push(format!("personal.email '{email}' is not a valid address"));
    }

    let prefs = &profile.preferences;
    let has_terms = prefs
        .target_titles
        .iter()
        .chain(prefs.keywords.iter())
        .any(|t| !t.trim().is_empty());
    if !has_terms {
        problems.push("preferences need at least one target title or keyword".to_string());
    }
    if prefs.min_salary.is_some_and(|s| s < 0.0) {
        problems.push("preferences.min_salary cannot be negative".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ProfileError::Invalid(problems))
    }
}
