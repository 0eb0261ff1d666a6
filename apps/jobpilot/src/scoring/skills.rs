//! Technical skill detection over free text.

use crate::models::{Job, Profile};

/// Canonical skill name followed by the lowercase spellings that count as a hit.
const SKILL_VOCABULARY: &[(&str, &[&str])] = &[
    ("Python", &["python"]),
    ("Java", &["java"]),
    ("JavaScript", &["javascript", "ecmascript"]),
    ("TypeScript", &["typescript"]),
    ("Go", &["golang", "go"]),
    ("Rust", &["rust"]),
    ("C++", &["c++", "cpp"]),
    ("C#", &["c#", ".net", "dotnet"]),
    ("Ruby", &["ruby", "rails"]),
    ("PHP", &["php"]),
    ("Kotlin", &["kotlin"]),
    ("Swift", &["swift"]),
    ("Scala", &["scala"]),
    ("SQL", &["sql"]),
    ("PostgreSQL", &["postgresql", "postgres"]),
    ("MySQL", &["mysql"]),
    ("MongoDB", &["mongodb", "mongo"]),
    ("Redis", &["redis"]),
    ("Elasticsearch", &["elasticsearch"]),
    ("Kafka", &["kafka"]),
    ("Spark", &["spark", "pyspark"]),
    ("Airflow", &["airflow"]),
    ("dbt", &["dbt"]),
    ("Snowflake", &["snowflake"]),
    ("React", &["react", "react.js", "reactjs"]),
    ("Vue", &["vue", "vue.js"]),
    ("Angular", &["angular"]),
    ("Node.js", &["node.js", "nodejs", "node"]),
    ("Django", &["django"]),
    ("Flask", &["flask"]),
    ("FastAPI", &["fastapi"]),
    ("Spring", &["spring boot", "spring"]),
    ("GraphQL", &["graphql"]),
    ("REST", &["rest api", "restful"]),
    ("gRPC", &["grpc"]),
    ("AWS", &["aws", "amazon web services"]),
    ("GCP", &["gcp", "google cloud"]),
    ("Azure", &["azure"]),
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("Terraform", &["terraform"]),
    ("Ansible", &["ansible"]),
    ("CI/CD", &["ci/cd", "continuous integration", "github actions", "jenkins"]),
    ("Linux", &["linux"]),
    ("Git", &["git"]),
    ("Machine Learning", &["machine learning", "ml"]),
    ("Deep Learning", &["deep learning"]),
    ("PyTorch", &["pytorch"]),
    ("TensorFlow", &["tensorflow"]),
    ("NLP", &["nlp", "natural language processing"]),
    ("LLM", &["llm", "llms", "large language model"]),
    ("Pandas", &["pandas"]),
    ("Tableau", &["tableau"]),
    ("Excel", &["excel"]),
    ("Figma", &["figma"]),
    ("Agile", &["agile", "scrum"]),
];

/// True if `term` occurs in `haystack` with no alphanumeric character on
/// either side. Both arguments must already be lowercase.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Canonical names of every vocabulary skill mentioned in `text`, in
/// vocabulary order.
pub fn extract_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    SKILL_VOCABULARY
        .iter()
        .filter(|(_, spellings)| spellings.iter().any(|s| contains_term(&lower, s)))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Skills the job asks for that the profile does not list.
pub fn skill_gap(profile: &Profile, job: &Job) -> Vec<String> {
    let have: Vec<String> = extract_skills(&profile.skills.join(", "))
        .into_iter()
        .chain(profile.skills.iter().map(|s| s.trim().to_string()))
        .map(|s| s.to_lowercase())
        .collect();

    extract_skills(&format!("{} {}", job.title, job.description))
        .into_iter()
        .filter(|skill| !have.contains(&skill.to_lowercase()))
        .collect()
}
