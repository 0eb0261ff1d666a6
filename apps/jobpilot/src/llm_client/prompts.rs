// Shared prompt fragments. Each service that calls the LLM keeps its own
// prompt templates next to it; only cross-cutting pieces live here.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for long-form career writing.
pub const CAREER_WRITER_SYSTEM: &str = "You are an expert career coach and technical recruiter. \
    You write concise, specific, honest application material. \
    Respond with the requested document only, in Markdown, with no preamble.";

/// Appended to every generation prompt.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only use facts present in the candidate profile. \
    Do NOT invent employers, dates, degrees, metrics or certifications. \
    If the profile does not support a claim, leave it out.";

/// Fills `{name}` placeholders in one pass over the template, so braces
/// inside substituted values are never expanded. Unknown placeholders are
/// left untouched.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find('}').and_then(|end| {
            let key = &tail[1..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, end + 1))
        });
        match value {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
