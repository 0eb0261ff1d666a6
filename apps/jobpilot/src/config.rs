use std::path::PathBuf;

use anyhow::{Context, Result};

/// Adzuna API credentials. Both halves are needed for any request.
#[derive(Debug, Clone)]
pub struct AdzunaCredentials {
    pub app_id: String,
    pub app_key: String,
    pub country: String,
}

/// USAJobs requires an API key plus the email it was registered with.
#[derive(Debug, Clone)]
pub struct UsaJobsCredentials {
    pub api_key: String,
    pub email: String,
}

/// Application configuration loaded from environment variables.
///
/// Nothing is strictly required: a source, LLM vendor or email provider whose
/// credentials are absent is simply disabled.
#[derive(Debug, Clone)]
pub struct Config {
    pub adzuna: Option<AdzunaCredentials>,
    pub usajobs: Option<UsaJobsCredentials>,
    pub enable_indeed_rss: bool,
    pub enable_remoteok: bool,
    pub enable_themuse: bool,
    pub boards_path: Option<PathBuf>,

    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub enable_llm_scoring: bool,

    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,

    pub email_provider: Option<String>,
    pub resend_api_key: Option<String>,
    pub sendgrid_api_key: Option<String>,
    pub email_from: String,

    pub profile_path: PathBuf,
    pub output_dir: PathBuf,

    pub max_concurrent_users: usize,
    pub source_delay_ms: u64,
    pub top_jobs: usize,
    pub kits_per_run: usize,
    pub min_score: u8,

    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let adzuna = match (get("ADZUNA_APP_ID"), get("ADZUNA_APP_KEY")) {
            (Some(app_id), Some(app_key)) => Some(AdzunaCredentials {
                app_id,
                app_key,
                country: get("ADZUNA_COUNTRY").unwrap_or_else(|| "us".to_string()),
            }),
            _ => None,
        };

        let usajobs = match (get("USAJOBS_API_KEY"), get("USAJOBS_EMAIL")) {
            (Some(api_key), Some(email)) => Some(UsaJobsCredentials { api_key, email }),
            _ => None,
        };

        Ok(Config {
            adzuna,
            usajobs,
            enable_indeed_rss: parse_flag(get("ENABLE_INDEED_RSS"), true),
            enable_remoteok: parse_flag(get("ENABLE_REMOTEOK"), true),
            enable_themuse: parse_flag(get("ENABLE_THEMUSE"), true),
            boards_path: get("BOARDS_PATH").map(PathBuf::from),

            llm_provider: get("LLM_PROVIDER").map(|p| p.to_lowercase()),
            llm_model: get("LLM_MODEL"),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            enable_llm_scoring: parse_flag(get("ENABLE_LLM_SCORING"), false),

            supabase_url: get("SUPABASE_URL"),
            supabase_service_key: get("SUPABASE_SERVICE_KEY"),

            email_provider: get("EMAIL_PROVIDER").map(|p| p.to_lowercase()),
            resend_api_key: get("RESEND_API_KEY"),
            sendgrid_api_key: get("SENDGRID_API_KEY"),
            email_from: get("EMAIL_FROM").unwrap_or_else(|| "jobpilot@localhost".to_string()),

            profile_path: PathBuf::from(
                get("PROFILE_PATH").unwrap_or_else(|| "data/profile.json".to_string()),
            ),
            output_dir: PathBuf::from(get("OUTPUT_DIR").unwrap_or_else(|| "output".to_string())),

            max_concurrent_users: parse_or("MAX_CONCURRENT_USERS", get("MAX_CONCURRENT_USERS"), 5)?,
            source_delay_ms: parse_or("SOURCE_DELAY_MS", get("SOURCE_DELAY_MS"), 1000)?,
            top_jobs: parse_or("TOP_JOBS", get("TOP_JOBS"), 20)?,
            kits_per_run: parse_or("KITS_PER_RUN", get("KITS_PER_RUN"), 3)?,
            min_score: parse_or("MIN_SCORE", get("MIN_SCORE"), 40)?,

            port: parse_or("PORT", get("PORT"), 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn supabase_enabled(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_service_key.is_some()
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim).map(str::to_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_empty_env() {
        let config = config_from(&[]).unwrap();
        assert!(config.adzuna.is_none());
        assert!(config.usajobs.is_none());
        assert!(config.enable_remoteok);
        assert!(!config.enable_llm_scoring);
        assert_eq!(config.max_concurrent_users, 5);
        assert_eq!(config.source_delay_ms, 1000);
        assert_eq!(config.port, 8080);
        assert_eq!(config.profile_path, PathBuf::from("data/profile.json"));
        assert!(!config.supabase_enabled());
    }

    #[test]
    fn test_adzuna_needs_both_halves() {
        let config = config_from(&[("ADZUNA_APP_ID", "id")]).unwrap();
        assert!(config.adzuna.is_none());

        let config = config_from(&[("ADZUNA_APP_ID", "id"), ("ADZUNA_APP_KEY", "key")]).unwrap();
        let adzuna = config.adzuna.unwrap();
        assert_eq!(adzuna.country, "us");
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = config_from(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = config_from(&[("MAX_CONCURRENT_USERS", "many")]).unwrap_err();
        assert!(err.to_string().contains("MAX_CONCURRENT_USERS"));
    }

    #[test]
    fn test_flags_parse_common_spellings() {
        let config = config_from(&[("ENABLE_REMOTEOK", "off"), ("ENABLE_LLM_SCORING", "YES")]).unwrap();
        assert!(!config.enable_remoteok);
        assert!(config.enable_llm_scoring);
    }
}
