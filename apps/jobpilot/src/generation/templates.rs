//! Static fallbacks used when no LLM is configured or a call fails.
//! Output is built only from profile facts.

use crate::generation::generator::OutreachKind;
use crate::generation::tone::{get_tone_examples, JobTone};
use crate::models::{Job, Profile};

pub fn resume(profile: &Profile, job: &Job) -> String {
    let mut out = format!("# {}\n\n", profile.display_name());

    let contact: Vec<&str> = [
        Some(profile.personal.email.as_str()).filter(|e| !e.is_empty()),
        profile.personal.phone.as_deref(),
        profile.personal.location.as_deref(),
        profile.personal.linkedin.as_deref(),
        profile.personal.github.as_deref(),
        profile.personal.website.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !contact.is_empty() {
        out.push_str(&contact.join(" | "));
        out.push_str("\n\n");
    }

    out.push_str("## Summary\n\n");
    if profile.summary.trim().is_empty() {
        let headline = profile.current_title().unwrap_or("Professional");
        out.push_str(&format!(
            "{headline} seeking the {} role at {}.\n\n",
            job.title, job.company
        ));
    } else {
        out.push_str(profile.summary.trim());
        out.push_str("\n\n");
    }

    if !profile.skills.is_empty() {
        // Skills the posting mentions go first.
        let text = job.searchable_text();
        let (mut relevant, rest): (Vec<&String>, Vec<&String>) = profile
            .skills
            .iter()
            .partition(|s| text.contains(&s.to_lowercase()));
        relevant.extend(rest);
        out.push_str("## Skills\n\n");
        out.push_str(&relevant.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "));
        out.push_str("\n\n");
    }

    if !profile.experience.is_empty() {
        out.push_str("## Experience\n\n");
        for exp in &profile.experience {
            out.push_str(&format!(
                "### {} — {}\n{} – {}\n\n",
                exp.title,
                exp.company,
                exp.start.as_deref().unwrap_or(""),
                exp.end.as_deref().unwrap_or("Present")
            ));
            for highlight in &exp.highlights {
                out.push_str(&format!("- {highlight}\n"));
            }
            out.push('\n');
        }
    }

    if !profile.education.is_empty() {
        out.push_str("## Education\n\n");
        for edu in &profile.education {
            let field = edu.field.as_deref().map(|f| format!(" in {f}")).unwrap_or_default();
            let year = edu.graduation_year.map(|y| format!(" ({y})")).unwrap_or_default();
            out.push_str(&format!("- {}{field}, {}{year}\n", edu.degree, edu.institution));
        }
        out.push('\n');
    }

    if !profile.certifications.is_empty() {
        out.push_str("## Certifications\n\n");
        for cert in &profile.certifications {
            out.push_str(&format!("- {cert}\n"));
        }
    }

    out.trim_end().to_string() + "\n"
}

pub fn cover_letter(profile: &Profile, job: &Job, tone: JobTone) -> String {
    let examples = get_tone_examples(tone);
    let company = if job.company.is_empty() { "your team" } else { job.company.as_str() };
    let top_skills = profile.skills.iter().take(3).cloned().collect::<Vec<_>>().join(", ");

    let mut body = format!("Dear Hiring Manager,\n\n{} the {} role at {company}.", examples.opening, job.title);
    if let Some(title) = profile.current_title() {
        body.push_str(&format!(" In my current work as a {title}, I have built a track record I believe fits this position."));
    }
    body.push_str("\n\n");

    if let Some(highlight) = profile.experience.iter().flat_map(|e| e.highlights.iter()).next() {
        body.push_str(&format!(
            "One example of the work I would bring: {}.\n\n",
            highlight.trim_end_matches('.')
        ));
    }
    if !top_skills.is_empty() {
        body.push_str(&format!(
            "My strengths in {top_skills} line up with what you describe, and I am eager to apply them at {company}.\n\n"
        ));
    }

    body.push_str(&format!(
        "Thank you for your consideration. I would welcome the chance to talk.\n\nSincerely,\n{}\n",
        profile.display_name()
    ));
    body
}

pub fn outreach(profile: &Profile, job: &Job, kind: OutreachKind) -> String {
    let name = profile.display_name();
    let strength = profile
        .skills
        .first()
        .map(|s| format!(" with a background in {s}"))
        .unwrap_or_default();

    match kind {
        OutreachKind::Recruiter => format!(
            "Hi, I'm {name}{strength}. I came across the {} opening at {} and believe my experience is a strong match. \
             Would you be open to a brief call this week to discuss whether I'd be a fit? Thank you!",
            job.title, job.company
        ),
        OutreachKind::HiringManager => format!(
            "Hello, I'm {name}{strength}. I just applied for the {} role on your team at {} and wanted to reach out directly. \
             I'd appreciate 15 minutes to learn what success looks like in the role. Thanks for your time.",
            job.title, job.company
        ),
        OutreachKind::Referral => format!(
            "Hi! I'm {name}{strength}. I'm applying for the {} position at {} and would be grateful for your perspective on the team. \
             If you feel comfortable, a referral would mean a lot. Happy to share my resume.",
            job.title, job.company
        ),
    }
}

pub fn learning_path(job: &Job, gap: &[String]) -> String {
    let mut out = format!("# Learning path for {} at {}\n\n", job.title, job.company);
    for (i, skill) in gap.iter().enumerate() {
        out.push_str(&format!(
            "## {}. {skill}\n\n\
             - Read the official {skill} documentation and complete its getting-started guide.\n\
             - Build a small project that uses {skill} and publish it.\n\
             - Estimated time: 2–3 weeks.\n\n",
            i + 1
        ));
    }
    out.push_str("Study the skills in the order listed.\n");
    out
}

pub fn no_gap_plan(job: &Job) -> String {
    format!(
        "# Learning path for {} at {}\n\n\
         No skill gaps detected: your listed skills cover what this posting mentions.\n\
         Spend prep time on company research and examples of your most relevant work.\n",
        job.title, job.company
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Education, Experience, PersonalInfo};
    use crate::models::JobSourceKind;

    fn profile() -> Profile {
        Profile {
            personal: PersonalInfo {
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                ..Default::default()
            },
            skills: vec!["Excel".into(), "Rust".into()],
            experience: vec![Experience {
                company: "Analytical Engines".into(),
                title: "Engineer".into(),
                highlights: vec!["Wrote the first published algorithm.".into()],
                ..Default::default()
            }],
            education: vec![Education {
                institution: "Home".into(),
                degree: "Mathematics".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn job() -> Job {
        Job::new(JobSourceKind::Adzuna, "Rust Developer", "Ferrous", "Remote", "u")
            .with_description("We write Rust.")
    }

    #[test]
    fn test_resume_puts_relevant_skills_first() {
        let text = resume(&profile(), &job());
        assert!(text.starts_with("# Ada Lovelace"));
        assert!(text.contains("Rust, Excel"));
        assert!(text.contains("- Wrote the first published algorithm."));
        assert!(text.contains("## Education"));
    }

    #[test]
    fn test_cover_letter_uses_tone_opening() {
        let text = cover_letter(&profile(), &job(), JobTone::Research);
        assert!(text.contains("I am drawn to the research questions behind the Rust Developer role at Ferrous."));
        assert!(text.trim_end().ends_with("Ada Lovelace"));
    }

    #[test]
    fn test_outreach_templates_stay_short() {
        for kind in [OutreachKind::Recruiter, OutreachKind::HiringManager, OutreachKind::Referral] {
            let text = outreach(&profile(), &job(), kind);
            assert!(text.split_whitespace().count() <= 120);
            assert!(text.contains("Ferrous"));
        }
    }

    #[test]
    fn test_learning_path_lists_each_gap() {
        let text = learning_path(&job(), &["Kafka".into(), "Terraform".into()]);
        assert!(text.contains("## 1. Kafka"));
        assert!(text.contains("## 2. Terraform"));
    }
}
