//! Daily digest email: top matches plus links to any generated kits.

use chrono::Utc;

use crate::email::EmailMessage;
use crate::models::{ApplicationKit, Job, Profile};

/// Jobs listed in the body; the report holds the rest.
const MAX_DIGEST_JOBS: usize = 10;

/// `jobs` is every match of the run; `new_jobs` is how many of them were not
/// tracked before.
pub fn render(profile: &Profile, jobs: &[Job], new_jobs: usize, kits: &[ApplicationKit]) -> EmailMessage {
    let name = profile.display_name();
    let shown = &jobs[..jobs.len().min(MAX_DIGEST_JOBS)];
    let subject = match jobs.first() {
        Some(top) => format!(
            "{} job {} ({new_jobs} new), top: {} at {} ({}%)",
            jobs.len(),
            if jobs.len() == 1 { "match" } else { "matches" },
            top.title,
            top.company,
            top.score
        ),
        None => "No job matches today".to_string(),
    };

    // Plain text
    let mut text = format!("Hi {name},\n\n");
    if jobs.is_empty() {
        text.push_str("No jobs matched your preferences today. We'll keep looking.\n");
    } else {
        text.push_str(&format!("Here are your top matches for {}:\n\n", Utc::now().format("%B %-d")));
        for (i, job) in shown.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} at {} ({}) - score {}{}\n   {}\n",
                i + 1,
                job.title,
                job.company,
                job.location,
                job.score,
                job.salary_display().map(|s| format!(", {s}")).unwrap_or_default(),
                job.url
            ));
        }
    }
    if !kits.is_empty() {
        text.push_str("\nApplication kits generated:\n");
        for kit in kits {
            text.push_str(&format!("- {} at {} ({})\n", kit.job_title, kit.company, kit.generator));
        }
    }
    text.push_str("\nGood luck!\n");

    // HTML
    let mut html = format!(
        "<html><body style=\"font-family: sans-serif\"><p>Hi {},</p>",
        escape_html(name)
    );
    if jobs.is_empty() {
        html.push_str("<p>No jobs matched your preferences today. We'll keep looking.</p>");
    } else {
        html.push_str("<table cellpadding=\"6\" style=\"border-collapse: collapse\">");
        html.push_str("<tr><th>Score</th><th>Role</th><th>Location</th><th>Salary</th></tr>");
        for job in shown {
            html.push_str(&format!(
                "<tr><td>{}</td><td><a href=\"{}\">{}</a><br>{}</td><td>{}</td><td>{}</td></tr>",
                job.score,
                escape_html(&job.url),
                escape_html(&job.title),
                escape_html(&job.company),
                escape_html(&job.location),
                escape_html(&job.salary_display().unwrap_or_default())
            ));
        }
        html.push_str("</table>");
        if jobs.len() > shown.len() {
            html.push_str(&format!(
                "<p>And {} more in today's report.</p>",
                jobs.len() - shown.len()
            ));
        }
    }
    if !kits.is_empty() {
        html.push_str("<h3>Application kits generated</h3><ul>");
        for kit in kits {
            html.push_str(&format!(
                "<li>{} at {}</li>",
                escape_html(&kit.job_title),
                escape_html(&kit.company)
            ));
        }
        html.push_str("</ul>");
    }
    html.push_str("<p>Good luck!</p></body></html>");

    EmailMessage {
        to: profile.personal.email.clone(),
        subject,
        html,
        text,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobSourceKind;

    fn profile() -> Profile {
        let mut profile = Profile::default();
        profile.personal.name = "Ada".into();
        profile.personal.email = "ada@example.com".into();
        profile
    }

    fn job(title: &str, score: u8) -> Job {
        let mut job = Job::new(JobSourceKind::Adzuna, title, "R&D Corp", "Berlin", "https://x.test/1");
        job.score = score;
        job
    }

    #[test]
    fn test_subject_names_top_job() {
        let message = render(&profile(), &[job("Rust Dev", 91), job("Go Dev", 70)], 1, &[]);
        assert_eq!(message.to, "ada@example.com");
        assert_eq!(message.subject, "2 job matches (1 new), top: Rust Dev at R&D Corp (91%)");
        assert!(message.text.contains("1. Rust Dev at R&D Corp (Berlin) - score 91"));
    }

    #[test]
    fn test_subject_counts_previously_tracked_matches_separately() {
        let message = render(&profile(), &[job("Rust Dev", 91)], 0, &[]);
        assert_eq!(message.subject, "1 job match (0 new), top: Rust Dev at R&D Corp (91%)");
    }

    #[test]
    fn test_html_is_escaped() {
        let message = render(&profile(), &[job("<script>", 50)], 1, &[]);
        assert!(message.html.contains("&lt;script&gt;"));
        assert!(message.html.contains("R&amp;D Corp"));
        assert!(!message.html.contains("<script>"));
    }

    #[test]
    fn test_empty_digest() {
        let message = render(&profile(), &[], 0, &[]);
        assert_eq!(message.subject, "No job matches today");
        assert!(message.text.contains("No jobs matched"));
    }

    #[test]
    fn test_long_lists_are_truncated() {
        let jobs: Vec<Job> = (0..15).map(|i| job(&format!("Role {i}"), 60)).collect();
        let message = render(&profile(), &jobs, 15, &[]);
        assert!(message.html.contains("And 5 more"));
        assert!(!message.text.contains("Role 12"));
    }
}
