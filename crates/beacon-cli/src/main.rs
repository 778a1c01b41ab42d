//! Admin CLI (spec §6, C14): a thin `clap`-based binary wiring the
//! registry/storage/scheduler/pipeline crates together for one-shot
//! operator commands. None of these require a running scheduler process —
//! every subcommand builds its own collaborators, does one unit of work,
//! and exits, in the shape of `riptide-cli`'s subcommand-per-binary style.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use beacon_browser::{HeadlessBrowserProvider, LocalBrowserPool, BrowserPoolConfig};
use beacon_config::{load_catalog_dir, RuntimeConfig};
use beacon_crawl::Crawler;
use beacon_fetchers::FetcherRegistry;
use beacon_http::HttpClient;
use beacon_pipeline::Pipeline;
use beacon_scheduler::{Scheduler, SchedulerConfig};
use beacon_storage::{ArtifactStore, FileSnapshotStore, LogStore, SourceStateStore};
use beacon_types::{Dimension, SnapshotStore};

#[derive(Parser)]
#[command(name = "beacon", about = "Information monitoring pipeline admin CLI")]
struct Cli {
    /// Directory holding the YAML source catalog (spec §6).
    #[arg(long, global = true, default_value = "sources", env = "BEACON_SOURCES_DIR")]
    sources_dir: PathBuf,

    /// Root directory for all on-disk state (spec §3, §6).
    #[arg(long, global = true, default_value = "data", env = "BEACON_DATA_DIR")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One-shot crawl of a single source by id.
    RunSingle {
        #[arg(long)]
        source: String,
    },
    /// One-shot crawl of every enabled source, optionally filtered to one dimension.
    RunAll {
        #[arg(long)]
        dimension: Option<String>,
    },
    /// Run the policy processor (spec §4.11).
    ProcessPolicy(ProcessArgs),
    /// Run the personnel processor (spec §4.11).
    ProcessPersonnel(ProcessArgs),
    /// Run the university-ecosystem processor (spec §4.11).
    ProcessUniversity(ProcessArgs),
    /// Run the tech-frontier processor (spec §4.11).
    ProcessTech(ProcessArgs),
    /// Run the daily-briefing processor (spec §4.11).
    ProcessBriefing(ProcessArgs),
    /// Run every stage of the daily pipeline (spec §4.10).
    RunPipeline,
    /// Regenerate `data/index.json` (spec §4.10 stage 7).
    GenerateIndex,
}

#[derive(Args)]
struct ProcessArgs {
    /// Compute outputs but write nothing (spec §4.11 `dry_run`).
    #[arg(long)]
    dry_run: bool,
    /// Ignore the hash tracker and reprocess every item (spec §4.11 `force`).
    #[arg(long)]
    force: bool,
}

/// Shared collaborators every subcommand needs. Built once per invocation;
/// the process exits right after, so there is no long-lived state beyond
/// what's already persisted to `data_dir`.
struct App {
    data_dir: PathBuf,
    runtime: RuntimeConfig,
    scheduler: Arc<Scheduler>,
    states: Arc<SourceStateStore>,
}

impl App {
    async fn bootstrap(sources_dir: &std::path::Path, data_dir: &std::path::Path) -> Result<Self> {
        let runtime = RuntimeConfig::from_env();
        let sources = load_catalog_dir(sources_dir)
            .with_context(|| format!("failed to load source catalog from {}", sources_dir.display()))?;
        info!(count = sources.len(), "loaded source catalog");

        let http = Arc::new(
            HttpClient::new(runtime.http_timeout, Duration::from_secs(0))
                .context("failed to build http client")?,
        );
        let browser: Arc<dyn HeadlessBrowserProvider> = Arc::new(LocalBrowserPool::new(BrowserPoolConfig {
            max_contexts: runtime.playwright_max_contexts,
            ..BrowserPoolConfig::default()
        }));
        let snapshots: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new(data_dir));
        let registry = Arc::new(FetcherRegistry::new(
            Arc::clone(&http),
            browser,
            snapshots,
            runtime.render_timeout,
            runtime.detail_render_timeout,
            runtime.twitter_api_key.clone(),
        ));
        let artifacts = Arc::new(ArtifactStore::new(data_dir));
        let states = Arc::new(
            SourceStateStore::load(data_dir)
                .await
                .context("failed to load source_state.json")?,
        );
        let logs = Arc::new(LogStore::new(data_dir));
        let crawler = Arc::new(Crawler::new(registry, artifacts, Arc::clone(&states), logs));

        let scheduler_config = SchedulerConfig {
            max_concurrent_crawls: runtime.max_concurrent_crawls,
            shutdown_drain_timeout: runtime.shutdown_drain_timeout,
        };
        let scheduler = Arc::new(Scheduler::new(sources, crawler, scheduler_config, data_dir));

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            runtime,
            scheduler,
            states,
        })
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::with_runtime_config(
            self.data_dir.as_path(),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.states),
            &self.runtime,
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let app = App::bootstrap(&cli.sources_dir, &cli.data_dir).await?;

    match cli.command {
        Command::RunSingle { source } => {
            let result = app
                .scheduler
                .trigger(&source)
                .await
                .with_context(|| format!("unknown source id: {source}"))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::RunAll { dimension } => {
            let dimension = dimension
                .map(|d| Dimension::from_str(&d))
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;
            let ids: Vec<String> = app
                .scheduler
                .sources()
                .iter()
                .filter(|s| s.enabled)
                .filter(|s| dimension.map(|d| d == s.dimension).unwrap_or(true))
                .map(|s| s.id.clone())
                .collect();
            let mut results = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(result) = app.scheduler.trigger(&id).await {
                    results.push(result);
                }
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::ProcessPolicy(args) => {
            let summary = app
                .pipeline()
                .policy_processor()
                .process(args.dry_run, args.force)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::ProcessPersonnel(args) => {
            let summary = app
                .pipeline()
                .personnel_processor()
                .process(args.dry_run, args.force)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::ProcessUniversity(args) => {
            let summary = app
                .pipeline()
                .university_processor()
                .process(args.dry_run, args.force)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::ProcessTech(args) => {
            let summary = app
                .pipeline()
                .tech_processor()
                .process(args.dry_run, args.force)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::ProcessBriefing(args) => {
            let summary = app
                .pipeline()
                .briefing_processor()
                .process(args.dry_run, args.force)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::RunPipeline => {
            let status = app.pipeline().run_daily().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::GenerateIndex => {
            let doc = beacon_pipeline::generate_index(&app.data_dir, &app.states, app.scheduler.sources().len()).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}
