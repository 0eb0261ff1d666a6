mod aggregator;
mod automation;
mod cli;
mod config;
mod email;
mod errors;
mod generation;
mod llm_client;
mod models;
mod profile;
mod routes;
mod scoring;
mod sources;
mod state;
mod storage;
mod supabase;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (.env is optional)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting JobPilot v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli, config).await
}
