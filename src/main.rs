mod config;
mod demo;
mod engine;
mod error;
mod fetch;
mod output;
mod signature;
mod store;
mod types;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::engine::rank::rank_outputs;
use crate::engine::EnrichmentPipeline;
use crate::error::Result;
use crate::store::{ListingStore, SqliteStore};
use crate::types::{ListingSnapshot, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Deterministic generated batch, no network.
    Demo,
    /// Fetch a batch from the configured live source.
    Live,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Demo => "demo",
            Mode::Live => "live",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "deal-radar", about = "Track listings over time and rank deal signals", version)]
struct Cli {
    #[arg(long, value_enum, default_value_t = Mode::Demo)]
    mode: Mode,
    /// Source for live mode (e.g. realtor_public_poc)
    #[arg(long, default_value = "public_demo")]
    source: String,
    /// Number of full deal records to emit
    #[arg(long, default_value_t = 50)]
    top_k: usize,
    #[arg(long, default_value = "data/app.sqlite")]
    db_path: String,
    /// Optional JSON settings file merged over the defaults
    #[arg(long, default_value = "config/settings.json")]
    config: PathBuf,
    #[arg(long, default_value = "public")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(Some(&cli.config))?;
    let now = Utc::now();

    if let Some(parent) = std::path::Path::new(&cli.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = SqliteStore::connect(&cli.db_path).await?;
    store.initialize().await?;
    info!(db_path = %cli.db_path, "store ready");

    let batch = collect_batch(&cli, &settings).await;
    info!(mode = cli.mode.as_str(), count = batch.len(), "batch collected");

    let pipeline = EnrichmentPipeline::new(&store, &settings);
    let enriched = pipeline.run(&batch, now).await?;

    let (deals, alerts) = rank_outputs(&enriched, cli.top_k);
    let summary = RunSummary {
        generated_at: now,
        mode: cli.mode.as_str().to_string(),
        listing_count: batch.len(),
        alert_count: alerts.len(),
        top_count: deals.len(),
        run_frequency: settings.run_frequency.clone(),
    };
    output::write_outputs(&cli.out_dir, alerts, deals, &summary)?;
    info!(out_dir = %cli.out_dir.display(), "wrote alerts, top deals and run summary");

    Ok(())
}

/// Produces this run's batch. Live fetch failures are logged and degrade to
/// an empty batch; the engine treats that as a valid run regardless of why
/// the source produced nothing.
async fn collect_batch(cli: &Cli, settings: &Settings) -> Vec<ListingSnapshot> {
    match cli.mode {
        Mode::Demo => demo::generate_demo_listings(settings, 200, Utc::now()),
        Mode::Live => {
            let fetched = match fetch::fetch_listings(&cli.source, settings).await {
                Ok(listings) => listings,
                Err(e) => {
                    warn!(source = %cli.source, error = %e, "live fetch failed, running on empty batch");
                    Vec::new()
                }
            };
            if cli.source == "public_demo" && fetched.is_empty() {
                demo::generate_demo_listings(settings, 120, Utc::now())
            } else {
                fetched
            }
        }
    }
}
