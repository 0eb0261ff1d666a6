// Generation prompt templates. Placeholders are filled with
// `llm_client::prompts::fill`.

pub const RESUME_PROMPT_TEMPLATE: &str = r#"Tailor this candidate's resume for the job below.

CANDIDATE PROFILE:
{profile}

JOB: {title} at {company} ({location})
DESCRIPTION:
{description}

Requirements:
- ATS-friendly Markdown: a name header, contact line, Summary, Skills, Experience, Education.
- Plain section headings, no tables, no columns, no images.
- Reorder skills and highlights so those relevant to the job come first.
- Mirror the job's terminology where the profile genuinely supports it.
- At most two pages of content.

{grounding}"#;

pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter from this candidate for the job below.

CANDIDATE PROFILE:
{profile}

JOB: {title} at {company} ({location})
DESCRIPTION:
{description}

TONE: {tone}
Prefer these verbs: {strong_verbs}
Never use: {avoid_verbs}
Suggested opening: "{opening}"

Requirements:
- Three or four short paragraphs, under 350 words.
- Connect two or three concrete profile highlights to the job's needs.
- End with a brief call to action and the candidate's name.

{grounding}"#;

pub const OUTREACH_PROMPT_TEMPLATE: &str = r#"Write a short {kind} message from this candidate about the job below.

CANDIDATE PROFILE:
{profile}

JOB: {title} at {company}

Audience: {audience}
Requirements:
- At most {max_words} words.
- Friendly and specific; mention one relevant strength.
- One clear ask. No subject line, no placeholders in brackets.

{grounding}"#;

pub const LEARNING_PATH_PROMPT_TEMPLATE: &str = r#"Create a learning plan that closes this candidate's skill gap for the job below.

CANDIDATE SKILLS: {skills}
JOB: {title} at {company}
MISSING SKILLS: {gap}

Requirements:
- Markdown with one section per missing skill, most important first.
- For each skill: why it matters for this job, two or three concrete resources,
  one small project that demonstrates it, and a realistic time estimate in weeks.
- Finish with a suggested order of study."#;
