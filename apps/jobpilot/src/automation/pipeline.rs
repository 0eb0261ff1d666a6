//! One automation run: search → dedupe → filter → score → kits → persist → notify.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::aggregator::{filters, JobAggregator, SourceReport};
use crate::config::Config;
use crate::email::{digest, Mailer};
use crate::generation::KitGenerator;
use crate::llm_client::LlmClient;
use crate::models::{ApplicationKit, Job, Profile};
use crate::profile::ProfileSource;
use crate::scoring::{build_scorer, score_and_rank, JobScorer};
use crate::sources::{build_sources, SearchQuery};
use crate::storage::{report, ApplicationRecord, Storage};
use crate::supabase::{SupabaseClient, UserRecord};

/// Limits applied after scoring.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub top_jobs: usize,
    pub kits_per_run: usize,
    pub min_score: u8,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_jobs: config.top_jobs,
            kits_per_run: config.kits_per_run,
            min_score: config.min_score,
        }
    }
}

/// What one run did. Persisted to `automation_runs` in multi-user mode.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub user_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub queries: usize,
    pub jobs_found: usize,
    pub jobs_unique: usize,
    pub jobs_after_filters: usize,
    pub jobs_matched: usize,
    pub new_jobs_tracked: usize,
    pub kits_generated: usize,
    pub kits_failed: usize,
    pub emailed: bool,
    pub report_path: Option<String>,
    pub sources: Vec<SourceReport>,
    /// Non-fatal failures, in the order they happened.
    pub errors: Vec<String>,
}

impl RunSummary {
    fn start(user_id: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            user_id: user_id.map(str::to_string),
            started_at: now,
            finished_at: now,
            queries: 0,
            jobs_found: 0,
            jobs_unique: 0,
            jobs_after_filters: 0,
            jobs_matched: 0,
            new_jobs_tracked: 0,
            kits_generated: 0,
            kits_failed: 0,
            emailed: false,
            report_path: None,
            sources: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, what: &str, err: impl std::fmt::Display) {
        warn!("{what} failed: {err}");
        self.errors.push(format!("{what}: {err}"));
    }
}

/// Ranked jobs from one search, before anything is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub jobs: Vec<Job>,
    pub total_before_dedup: usize,
    pub unique: usize,
    pub after_filters: usize,
    pub sources: Vec<SourceReport>,
}

/// Ad-hoc changes to the profile's search, from the CLI or the mobile app.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchOverrides {
    /// Replaces the profile's target titles with a single query.
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub remote_only: Option<bool>,
}

impl SearchOverrides {
    pub fn queries(&self, profile: &Profile) -> Vec<SearchQuery> {
        let mut queries = match self.keywords.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(keywords) => {
                let base = SearchQuery::from_preferences(&profile.preferences)
                    .into_iter()
                    .next();
                let mut query = SearchQuery::new(keywords);
                if let Some(base) = base {
                    query.location = base.location;
                    query.remote_only = base.remote_only;
                    query.salary_min = base.salary_min;
                    query.max_results = base.max_results;
                }
                vec![query]
            }
            None => SearchQuery::from_preferences(&profile.preferences),
        };

        for query in &mut queries {
            if let Some(location) = self.location.as_deref().map(str::trim) {
                query.location = (!location.is_empty()).then(|| location.to_string());
            }
            if let Some(remote_only) = self.remote_only {
                query.remote_only = remote_only;
            }
        }
        queries
    }
}

/// Per-user result of a multi-user run.
#[derive(Debug, Clone, Serialize)]
pub struct UserOutcome {
    pub user_id: String,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
}

impl UserOutcome {
    fn from_result(user_id: String, result: Result<RunSummary, String>) -> Self {
        match result {
            Ok(summary) => Self { user_id, summary: Some(summary), error: None },
            Err(e) => Self { user_id, summary: None, error: Some(e) },
        }
    }
}

pub struct Pipeline {
    aggregator: JobAggregator,
    scorer: Arc<dyn JobScorer>,
    generator: KitGenerator,
    mailer: Option<Mailer>,
    supabase: Option<SupabaseClient>,
    output_dir: PathBuf,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        aggregator: JobAggregator,
        scorer: Arc<dyn JobScorer>,
        generator: KitGenerator,
        output_dir: impl Into<PathBuf>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            aggregator,
            scorer,
            generator,
            mailer: None,
            supabase: None,
            output_dir: output_dir.into(),
            settings,
        }
    }

    pub fn with_mailer(mut self, mailer: Mailer) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_supabase(mut self, supabase: SupabaseClient) -> Self {
        self.supabase = Some(supabase);
        self
    }

    /// Wires every component from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let aggregator = JobAggregator::new(
            build_sources(config)?,
            Duration::from_millis(config.source_delay_ms),
        );
        let llm = LlmClient::from_config(config)?;
        let scorer = build_scorer(config, llm.as_ref());
        info!("Job scorer: {}", scorer.backend());
        let generator = KitGenerator::new(llm);

        let mut pipeline = Self::new(
            aggregator,
            scorer,
            generator,
            config.output_dir.clone(),
            PipelineSettings::from_config(config),
        )
        .with_mailer(Mailer::from_config(config)?);

        if let (Some(url), Some(key)) = (&config.supabase_url, &config.supabase_service_key) {
            pipeline = pipeline.with_supabase(SupabaseClient::new(url.clone(), key.clone())?);
            info!("Supabase enabled");
        }
        Ok(pipeline)
    }

    pub fn generator(&self) -> &KitGenerator {
        &self.generator
    }

    pub fn scorer(&self) -> &dyn JobScorer {
        self.scorer.as_ref()
    }

    pub fn supabase(&self) -> Option<&SupabaseClient> {
        self.supabase.as_ref()
    }

    pub fn source_names(&self) -> Vec<String> {
        self.aggregator.source_names()
    }

    pub fn storage(&self, user_id: Option<&str>) -> Storage {
        Storage::new(&self.output_dir, user_id)
    }

    /// Search, dedupe, filter, score and rank. Nothing is persisted.
    pub async fn search(&self, profile: &Profile, queries: &[SearchQuery]) -> SearchOutcome {
        let aggregate = self.aggregator.search(queries).await;
        let unique = aggregate.jobs.len();
        let filtered = filters::apply(aggregate.jobs, &profile.preferences);
        let after_filters = filtered.len();
        let jobs = score_and_rank(self.scorer.as_ref(), profile, filtered).await;

        SearchOutcome {
            jobs,
            total_before_dedup: aggregate.total_before_dedup,
            unique,
            after_filters,
            sources: aggregate.sources,
        }
    }

    /// Full run for one profile. Only an empty search is reported as nothing
    /// to do; every later failure is logged, recorded and skipped.
    pub async fn run_for_profile(&self, profile: &Profile, user_id: Option<&str>) -> RunSummary {
        let mut summary = RunSummary::start(user_id);
        let who = user_id.unwrap_or(profile.display_name()).to_string();
        let storage = self.storage(user_id);
        let today = Local::now().date_naive();

        let queries = SearchQuery::from_preferences(&profile.preferences);
        summary.queries = queries.len();
        if queries.is_empty() {
            summary.fail("search", "profile has no target titles or keywords");
            summary.finished_at = Utc::now();
            return summary;
        }

        info!("Running automation for {who} with {} queries", queries.len());
        let outcome = self.search(profile, &queries).await;
        summary.jobs_found = outcome.total_before_dedup;
        summary.jobs_unique = outcome.unique;
        summary.jobs_after_filters = outcome.after_filters;
        summary.sources = outcome.sources;

        let top: Vec<Job> = outcome
            .jobs
            .into_iter()
            .filter(|job| job.score >= self.settings.min_score)
            .take(self.settings.top_jobs)
            .collect();
        summary.jobs_matched = top.len();
        info!("{who}: {} jobs scored at least {}", top.len(), self.settings.min_score);

        // Kits
        let mut kits: Vec<ApplicationKit> = Vec::new();
        for job in top.iter().take(self.settings.kits_per_run) {
            let kit = self.generator.generate_kit(profile, job).await;
            match storage.kits.save(&kit, today) {
                Ok(path) => {
                    if let Err(e) = storage
                        .applications
                        .append(&ApplicationRecord::generated(&kit, job.score, &path))
                    {
                        summary.fail("application tracker", e);
                    }
                    if kit.used_fallback() {
                        info!("Kit for '{}' used template fallback", kit.job_title);
                    }
                    summary.kits_generated += 1;
                    kits.push(kit);
                }
                Err(e) => {
                    summary.kits_failed += 1;
                    summary.fail(&format!("kit for '{}'", job.title), e);
                }
            }
        }

        // Persist
        match storage.jobs.append_new(&top) {
            Ok(n) => summary.new_jobs_tracked = n,
            Err(e) => summary.fail("job tracker", e),
        }
        match report::write_report(&storage.reports_dir(), &top, today) {
            Ok(path) => summary.report_path = Some(path.display().to_string()),
            Err(e) => summary.fail("report", e),
        }

        if let (Some(supabase), Some(user_id)) = (&self.supabase, user_id) {
            if let Err(e) = supabase.upsert_jobs(user_id, &top).await {
                summary.fail("supabase upsert", e);
            }
        }

        // Notify
        if profile.preferences.email_digest {
            if let Some(mailer) = &self.mailer {
                let message = digest::render(profile, &top, summary.new_jobs_tracked, &kits);
                match mailer.send(&message).await {
                    Ok(_) => summary.emailed = true,
                    Err(e) => summary.fail("email digest", e),
                }
            }
        }

        summary.finished_at = Utc::now();
        if let (Some(supabase), Some(_)) = (&self.supabase, user_id) {
            if let Err(e) = supabase.record_run(&summary).await {
                warn!("Failed to record run {}: {e}", summary.run_id);
            }
        }

        info!(
            "{who}: run finished: {} matched, {} kits, {} errors",
            summary.jobs_matched,
            summary.kits_generated,
            summary.errors.len()
        );
        summary
    }

    /// Runs every active user, at most `max_concurrent` at a time.
    pub async fn run_all_users(self: &Arc<Self>, users: Vec<UserRecord>, max_concurrent: usize) -> Vec<UserOutcome> {
        let Some(supabase) = self.supabase.clone() else {
            error!("Multi-user run requested but Supabase is not configured");
            return Vec::new();
        };
        let profiles = ProfileSource::Supabase(supabase);

        let ids: Vec<String> = users.into_iter().map(|u| u.id).collect();
        let pipeline = Arc::clone(self);
        run_bounded(ids, max_concurrent, move |user_id| {
            let pipeline = Arc::clone(&pipeline);
            let profiles = profiles.clone();
            async move {
                let profile = profiles
                    .load(Some(&user_id))
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(pipeline.run_for_profile(&profile, Some(&user_id)).await)
            }
        })
        .await
    }
}

/// Runs `task` once per user with at most `limit` running at a time.
/// A failing user is logged and reported; it is never retried. Every user
/// gets exactly one outcome, including users whose task panicked.
pub async fn run_bounded<F, Fut>(user_ids: Vec<String>, limit: usize, task: F) -> Vec<UserOutcome>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<RunSummary, String>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut pending: Vec<Option<String>> = user_ids.iter().cloned().map(Some).collect();

    for (index, user_id) in user_ids.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let work = task(user_id.clone());
        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => work.await,
                Err(e) => Err(format!("semaphore closed: {e}")),
            };
            (index, user_id, outcome)
        });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, user_id, result)) => {
                pending[index] = None;
                if let Err(e) = &result {
                    error!("Automation failed for user {user_id}: {e}");
                }
                outcomes.push((index, UserOutcome::from_result(user_id, result)));
            }
            Err(e) => error!("User task panicked or was cancelled: {e}"),
        }
    }

    // Tasks that never returned leave their slot pending.
    for (index, user_id) in pending.into_iter().enumerate() {
        if let Some(user_id) = user_id {
            outcomes.push((index, UserOutcome {
                user_id,
                summary: None,
                error: Some("automation task panicked".to_string()),
            }));
        }
    }
    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}
