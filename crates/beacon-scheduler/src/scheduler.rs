//! `Scheduler` (spec §4.9, C9): loads the catalog once, then keeps one
//! background task alive per enabled source for the lifetime of the
//! process — `tokio::time::interval` for the fixed `2h`/`4h` tiers,
//! `cron::Schedule::upcoming` for `daily`/`weekly`/`monthly` — governed by
//! a global concurrency semaphore and a per-source "already running"
//! guard (`max_instances: 1`, spec §4.9).

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashSet;
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use beacon_crawl::Crawler;
use beacon_storage::paths::raw_dir;
use beacon_types::{CrawlResult, SourceDefinition};

use crate::error::SchedulerError;
use crate::jitter::draw_jitter;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_concurrent_crawls: usize,
    pub shutdown_drain_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_crawls: 5,
            shutdown_drain_timeout: Duration::from_secs(30),
        }
    }
}

pub struct Scheduler {
    sources: Vec<SourceDefinition>,
    by_id: HashMap<String, SourceDefinition>,
    crawler: Arc<Crawler>,
    config: SchedulerConfig,
    data_root: std::path::PathBuf,
    global: Arc<Semaphore>,
    in_flight: Arc<DashSet<String>>,
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        sources: Vec<SourceDefinition>,
        crawler: Arc<Crawler>,
        config: SchedulerConfig,
        data_root: impl Into<std::path::PathBuf>,
    ) -> Self {
        let by_id = sources.iter().map(|s| (s.id.clone(), s.clone())).collect();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            sources,
            by_id,
            crawler,
            global: Arc::new(Semaphore::new(config.max_concurrent_crawls.max(1))),
            config,
            data_root: data_root.into(),
            in_flight: Arc::new(DashSet::new()),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            shutdown_rx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// `data/raw` missing or empty signals a first run (spec §4.9 "on
    /// startup, if no raw artifacts exist yet, prime the catalog with one
    /// immediate pass rather than waiting for the first scheduled tick").
    fn is_first_run(&self) -> bool {
        match std::fs::read_dir(raw_dir(&self.data_root)) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    /// Spawn one background loop per enabled source and, on a first run,
    /// an immediate unscheduled pass over the whole catalog. Returns
    /// immediately; the loops run for the life of the `Scheduler`.
    pub async fn start(self: &Arc<Self>) {
        self.running.store(true, Ordering::SeqCst);

        if self.is_first_run() {
            info!("data/raw is empty, priming catalog with an immediate pass");
            let this = Arc::clone(self);
            tokio::spawn(async move { this.run_all_once().await });
        }

        let mut handles = self.handles.lock().await;
        for source in self.sources.iter().filter(|s| s.enabled) {
            let this = Arc::clone(self);
            let source = source.clone();
            handles.push(tokio::spawn(async move { this.run_source_loop(source).await }));
        }
        info!(count = handles.len(), "scheduler started");
    }

    /// Trigger every enabled source once, concurrently, respecting the
    /// same global semaphore and per-source guard as the periodic loops.
    async fn run_all_once(self: &Arc<Self>) {
        self.crawl_all().await;
    }

    /// Trigger every enabled source once, concurrently, and return each
    /// source's result. The pipeline orchestrator's "crawl all enabled
    /// sources" stage (spec §4.10 stage 1) drives this directly rather
    /// than waiting for a scheduled tick.
    pub async fn crawl_all(self: &Arc<Self>) -> Vec<(String, Option<CrawlResult>)> {
        let ids: Vec<String> = self
            .sources
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.id.clone())
            .collect();
        let runs = ids.into_iter().map(|id| {
            let this = Arc::clone(self);
            async move {
                let result = this.trigger(&id).await;
                (id, result)
            }
        });
        futures::future::join_all(runs).await
    }

    #[instrument(skip(self, source), fields(source_id = %source.id))]
    async fn run_source_loop(self: Arc<Self>, source: SourceDefinition) {
        let jitter = draw_jitter();
        let mut shutdown_rx = self.shutdown_rx.clone();

        if source.schedule.is_fixed_interval() {
            let period = source
                .schedule
                .interval()
                .expect("fixed-interval schedule always has an interval");

            tokio::select! {
                _ = tokio::time::sleep(jitter) => {}
                _ = shutdown_rx.changed() => { return; }
            }

            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.trigger(&source.id).await;
                    }
                    _ = shutdown_rx.changed() => { return; }
                }
            }
        } else {
            let expr = source
                .schedule
                .cron_expression()
                .expect("non-fixed schedule always has a cron expression");
            let schedule = match cron::Schedule::from_str(expr) {
                Ok(s) => s,
                Err(e) => {
                    warn!(source_id = %source.id, error = %e, "invalid cron expression, source will never run");
                    return;
                }
            };

            loop {
                let now = Utc::now();
                let delay = schedule
                    .upcoming(Utc)
                    .next()
                    .and_then(|next| (next - now).to_std().ok())
                    .unwrap_or(Duration::from_secs(1))
                    + jitter;

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        self.trigger(&source.id).await;
                    }
                    _ = shutdown_rx.changed() => { return; }
                }
            }
        }
    }

    /// Manually trigger one source by id (admin CLI `run-single`, spec
    /// §4.9, §5). Returns `None` when a previous run of the same source
    /// is still in flight — `max_instances: 1` rejects rather than queues.
    pub async fn trigger(&self, source_id: &str) -> Option<CrawlResult> {
        let source = self.by_id.get(source_id)?;

        if !self.in_flight.insert(source_id.to_string()) {
            warn!(source_id, "previous run still in flight, rejecting trigger");
            return None;
        }

        let permit = match self.global.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                self.in_flight.remove(source_id);
                return None;
            }
        };

        let result = self.crawler.run(source).await;
        drop(permit);
        self.in_flight.remove(source_id);
        Some(result)
    }

    pub fn try_trigger(&self, source_id: &str) -> Result<bool, SchedulerError> {
        if !self.by_id.contains_key(source_id) {
            return Err(SchedulerError::UnknownSource(source_id.to_string()));
        }
        Ok(!self.in_flight.contains(source_id))
    }

    pub fn sources(&self) -> &[SourceDefinition] {
        &self.sources
    }

    /// Signal every background loop to stop and wait up to
    /// `shutdown_drain_timeout` for in-flight crawls to finish (spec
    /// §4.9 "graceful shutdown drains in-flight fetches before exit").
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        let mut handles = self.handles.lock().await;
        let joins = std::mem::take(&mut *handles);
        let drain = futures::future::join_all(joins);
        if tokio::time::timeout(self.config.shutdown_drain_timeout, drain).await.is_err() {
            warn!(
                timeout_secs = self.config.shutdown_drain_timeout.as_secs(),
                "scheduler shutdown drain timed out, in-flight crawls may have been abandoned"
            );
        }
        info!("scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
