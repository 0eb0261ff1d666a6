//! CLI command definitions and routing.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::automation::{parse_schedule, run_daily, Pipeline, SearchOverrides};
use crate::config::Config;
use crate::profile::{compute_completeness_report, validate, ProfileSource};
use crate::routes::build_router;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// JobPilot: find jobs, score them against your profile and draft applications.
#[derive(Parser)]
#[command(name = "jobpilot", version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full automation pipeline.
    Run(RunArgs),

    /// Search, score and print jobs without saving anything.
    Search {
        /// Replaces the profile's target titles.
        #[arg(short, long)]
        keywords: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        /// Only remote roles.
        #[arg(long)]
        remote: bool,

        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Inspect the local profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Start the HTTP API for the mobile app.
    Serve {
        /// Overrides PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Run once immediately (default).
    #[arg(long, conflicts_with = "schedule")]
    pub now: bool,

    /// Run every day at this local time, HH:MM.
    #[arg(long, value_name = "HH:MM")]
    pub schedule: Option<String>,

    /// Run every Supabase user with automation enabled.
    #[arg(long)]
    pub all_users: bool,
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Check required fields and exit non-zero when any are missing.
    Validate,
    /// Print the profile and its completeness report.
    Show,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Run(args) => run_automation(args, config).await,
        Command::Search {
            keywords,
            location,
            remote,
            limit,
        } => {
            let overrides = SearchOverrides {
                keywords,
                location,
                remote_only: remote.then_some(true),
            };
            search(config, overrides, limit).await
        }
        Command::Profile { action } => profile_command(action, &config),
        Command::Serve { port } => serve(config, port).await,
    }
}

async fn run_automation(args: RunArgs, config: Config) -> Result<()> {
    if args.all_users && !config.supabase_enabled() {
        bail!("--all-users needs SUPABASE_URL and SUPABASE_SERVICE_KEY");
    }
    let pipeline = Arc::new(Pipeline::from_config(&config)?);
    let all_users = args.all_users;

    match args.schedule.as_deref() {
        Some(schedule) => {
            let at = parse_schedule(schedule)?;
            info!("Scheduling daily run at {}", at.format("%H:%M"));
            run_daily(at, || {
                let pipeline = Arc::clone(&pipeline);
                let config = config.clone();
                async move {
                    if let Err(e) = run_once(&pipeline, &config, all_users).await {
                        error!("Scheduled run failed: {e:#}");
                    }
                }
            })
            .await;
            Ok(())
        }
        None => run_once(&pipeline, &config, all_users).await,
    }
}

async fn run_once(pipeline: &Arc<Pipeline>, config: &Config, all_users: bool) -> Result<()> {
    if all_users {
        let supabase = pipeline
            .supabase()
            .context("Supabase is not configured")?;
        let users = supabase.active_users().await?;
        info!("Running automation for {} users", users.len());

        let outcomes = pipeline
            .run_all_users(users, config.max_concurrent_users)
            .await;
        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        info!("Multi-user run finished: {} users, {failed} failed", outcomes.len());
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    let source = ProfileSource::File(config.profile_path.clone());
    info!("Loading profile from {}", source.describe());
    let profile = source.load(None).await?;
    let summary = pipeline.run_for_profile(&profile, None).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn search(config: Config, overrides: SearchOverrides, limit: usize) -> Result<()> {
    let pipeline = Pipeline::from_config(&config)?;
    let profile = ProfileSource::File(config.profile_path.clone())
        .load(None)
        .await?;

    let queries = overrides.queries(&profile);
    if queries.is_empty() {
        bail!("Nothing to search for: pass --keywords or add target titles to the profile");
    }

    let outcome = pipeline.search(&profile, &queries).await;
    println!(
        "{} jobs found, {} unique, {} after filters\n",
        outcome.total_before_dedup, outcome.unique, outcome.after_filters
    );
    for (i, job) in outcome.jobs.iter().take(limit).enumerate() {
        println!(
            "{:>2}. [{:>3}] {} at {} ({}){}\n     {}",
            i + 1,
            job.score,
            job.title,
            job.company,
            job.location,
            job.salary_display().map(|s| format!(", {s}")).unwrap_or_default(),
            job.url
        );
    }
    Ok(())
}

fn profile_command(action: ProfileAction, config: &Config) -> Result<()> {
    let profile = crate::profile::load_from_file(&config.profile_path)?;

    match action {
        ProfileAction::Validate => {
            validate(&profile)?;
            println!("{} is valid", config.profile_path.display());
        }
        ProfileAction::Show => {
            let report = compute_completeness_report(&profile);
            println!("{}", serde_json::to_string_pretty(&profile)?);
            println!("\nCompleteness: {}%", report.percentage);
            for section in &report.sections {
                println!("  {:<15} {:>3.0}%  {:?}", section.section, section.score * 100.0, section.status);
                for tip in &section.recommendations {
                    println!("      - {tip}");
                }
            }
        }
    }
    Ok(())
}

async fn serve(mut config: Config, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    let pipeline = Arc::new(Pipeline::from_config(&config)?);
    let state = AppState::new(&config, pipeline);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from(["jobpilot", "run", "--schedule", "08:30", "--all-users"]).unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.schedule.as_deref(), Some("08:30"));
                assert!(args.all_users);
                assert!(!args.now);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_now_conflicts_with_schedule() {
        assert!(Cli::try_parse_from(["jobpilot", "run", "--now", "--schedule", "08:30"]).is_err());
    }

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["jobpilot", "search", "-k", "rust"]).unwrap();
        match cli.command {
            Command::Search { keywords, limit, remote, .. } => {
                assert_eq!(keywords.as_deref(), Some("rust"));
                assert_eq!(limit, 10);
                assert!(!remote);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_profile_subcommands() {
        assert!(matches!(
            Cli::try_parse_from(["jobpilot", "profile", "validate"]).unwrap().command,
            Command::Profile { action: ProfileAction::Validate }
        ));
        assert!(Cli::try_parse_from(["jobpilot", "profile"]).is_err());
    }
}
