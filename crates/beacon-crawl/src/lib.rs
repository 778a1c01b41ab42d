//! Crawler base protocol (spec §4.7, C7): wraps one fetcher run end to
//! end — build the fetcher via the registry, fetch, dedup against the
//! prior artifact, persist, classify, and record state/logs — without
//! ever propagating an exception to the caller (spec §7 "Fetchers
//! convert all fetch/decode/selector errors into a CrawlResult with
//! `status = FAILED`... they do not propagate exceptions to the
//! scheduler").

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use beacon_fetchers::FetcherRegistry;
use beacon_storage::{ArtifactStore, LogStore, SourceStateStore};
use beacon_types::error::MonitorError;
use beacon_types::source::{FetchKind, SourceDefinition};
use beacon_types::{CrawlResult, CrawlStatus, RunLogEntry};

/// List-oriented strategies where zero items signals selector drift
/// rather than a legitimately empty feed (spec §4.4, §8 "Selector
/// matches zero items -> SelectorMiss logged, CrawlResult FAILED").
fn is_list_based(kind: &FetchKind) -> bool {
    matches!(kind, FetchKind::Static | FetchKind::Dynamic | FetchKind::Faculty)
}

pub struct Crawler {
    registry: Arc<FetcherRegistry>,
    artifacts: Arc<ArtifactStore>,
    states: Arc<SourceStateStore>,
    logs: Arc<LogStore>,
}

impl Crawler {
    pub fn new(
        registry: Arc<FetcherRegistry>,
        artifacts: Arc<ArtifactStore>,
        states: Arc<SourceStateStore>,
        logs: Arc<LogStore>,
    ) -> Self {
        Self {
            registry,
            artifacts,
            states,
            logs,
        }
    }

    /// Run one source to completion, always producing a `CrawlResult`
    /// (spec §4.7 steps 1-6).
    #[instrument(skip(self, source), fields(source_id = %source.id))]
    pub async fn run(&self, source: &SourceDefinition) -> CrawlResult {
        let started_at = Utc::now();

        let fetch_kind = match source.resolve_fetch_kind() {
            Ok(kind) => kind,
            Err(message) => return self.finish_failed(source, started_at, message).await,
        };

        let outcome = match self.registry.build_fetcher(source) {
            Ok(fetcher) => fetcher.fetch_and_parse(source).await,
            Err(e) => Err(e),
        };

        let (items, item_errors, fatal_error) = match outcome {
            Ok(outcome) => {
                if outcome.items.is_empty() && is_list_based(&fetch_kind) {
                    let miss = MonitorError::selector_miss(&source.url, source.list_selectors.list_item.clone());
                    warn!(source_id = %source.id, "selector matched zero items");
                    (Vec::new(), Vec::new(), Some(miss.to_string()))
                } else {
                    (outcome.items, outcome.item_errors, None)
                }
            }
            Err(e) => (Vec::new(), Vec::new(), Some(e.to_string())),
        };

        let had_item_errors = !item_errors.is_empty();

        if let Some(message) = fatal_error {
            return self.finish_failed(source, started_at, message).await;
        }

        let artifact = match self
            .artifacts
            .write(
                &source.id,
                source.dimension,
                source.group.as_deref(),
                &source.name,
                Utc::now(),
                items,
            )
            .await
        {
            Ok(artifact) => artifact,
            Err(e) => return self.finish_failed(source, started_at, e.to_string()).await,
        };

        let ended_at = Utc::now();
        let items_new = artifact.new_item_count;
        let result = CrawlResult::classify(
            source.id.clone(),
            started_at,
            ended_at,
            artifact.items,
            items_new,
            had_item_errors,
            None,
        );

        self.record(source, &result).await;
        info!(
            source_id = %source.id,
            status = ?result.status,
            items_total = result.items_total,
            items_new = result.items_new,
            "crawl finished"
        );
        result
    }

    async fn finish_failed(&self, source: &SourceDefinition, started_at: chrono::DateTime<Utc>, message: String) -> CrawlResult {
        let ended_at = Utc::now();
        let result = CrawlResult::failed(source.id.clone(), started_at, ended_at, message);
        self.record(source, &result).await;
        warn!(source_id = %source.id, error = %result.error_message.as_deref().unwrap_or(""), "crawl failed");
        result
    }

    async fn record(&self, source: &SourceDefinition, result: &CrawlResult) {
        let _ = self
            .states
            .update(&source.id, |state| state.record_run(result.status, result.ended_at))
            .await;

        let _ = self
            .logs
            .append(
                &source.id,
                RunLogEntry {
                    timestamp: result.ended_at,
                    status: result.status,
                    items_total: result.items_total,
                    items_new: result.items_new,
                    duration_seconds: result.duration_seconds,
                    error_message: result.error_message.clone(),
                },
            )
            .await;
    }
}

/// `CrawlStatus` re-exported for callers that only need to branch on the
/// outcome without depending on `beacon-types` directly.
pub use CrawlStatus as Status;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use beacon_browser::{BrowserContext, HeadlessBrowserProvider};
    use beacon_http::HttpClient;
    use beacon_types::artifact::SnapshotStore as SnapshotStoreTrait;
    use beacon_types::error::MonitorResult;
    use beacon_types::{Dimension, FetchStrategy, ListSelectors, Schedule, SnapshotRecord};
    use std::collections::HashMap;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NullBrowser;
    #[async_trait]
    impl HeadlessBrowserProvider for NullBrowser {
        async fn acquire(&self) -> MonitorResult<Box<dyn BrowserContext>> {
            Err(MonitorError::render("", "no browser in tests"))
        }
    }

    struct NullSnapshots;
    #[async_trait]
    impl SnapshotStoreTrait for NullSnapshots {
        async fn latest(&self, _source_id: &str) -> MonitorResult<Option<SnapshotRecord>> {
            Ok(None)
        }
        async fn append(&self, _source_id: &str, _record: SnapshotRecord) -> MonitorResult<()> {
            Ok(())
        }
    }

    fn source(id: &str, url: String, list_item: &str) -> SourceDefinition {
        SourceDefinition {
            id: id.to_string(),
            name: "Example".into(),
            dimension: Dimension::Technology,
            group: None,
            url,
            fetch_strategy: Some(FetchStrategy::Static),
            parser_kind: None,
            schedule: Schedule::Daily,
            enabled: true,
            priority: 0,
            list_selectors: ListSelectors {
                list_item: list_item.to_string(),
                title: "a".to_string(),
                link: "a".to_string(),
                link_attr: "href".to_string(),
                date: String::new(),
                date_format: None,
                date_regex: None,
            },
            detail_selectors: None,
            wait_condition: None,
            keyword_filter: None,
            base_url: None,
            tags: vec![],
            headers: HashMap::new(),
            encoding: None,
            request_delay_seconds: None,
            extras: Default::default(),
        }
    }

    async fn crawler(dir: &std::path::Path) -> Crawler {
        let http = Arc::new(HttpClient::new(Duration::from_secs(5), Duration::from_millis(0)).unwrap());
        let registry = Arc::new(FetcherRegistry::new(
            http,
            Arc::new(NullBrowser),
            Arc::new(NullSnapshots),
            Duration::from_secs(15),
            Duration::from_secs(10),
            None,
        ));
        let artifacts = Arc::new(ArtifactStore::new(dir));
        let states = Arc::new(SourceStateStore::load(dir).await.unwrap());
        let logs = Arc::new(LogStore::new(dir));
        Crawler::new(registry, artifacts, states, logs)
    }

    #[tokio::test]
    async fn successful_run_is_classified_success_and_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<ul class="list"><li><a href="/a">First</a></li></ul>"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let src = source("ex1", server.uri(), "ul.list li");

        let result = crawler.run(&src).await;
        assert_eq!(result.status, CrawlStatus::Success);
        assert_eq!(result.items_new, 1);

        let logs = crawler.logs.read("ex1").await.unwrap();
        assert_eq!(logs.len(), 1);
        let state = crawler.states.get("ex1").await;
        assert!(state.last_success_at.is_some());
    }

    #[tokio::test]
    async fn rerun_with_unchanged_page_is_no_new_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<ul class="list"><li><a href="/a">First</a></li></ul>"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let src = source("ex1", server.uri(), "ul.list li");

        crawler.run(&src).await;
        let second = crawler.run(&src).await;
        assert_eq!(second.status, CrawlStatus::NoNewContent);
        assert_eq!(second.items_new, 0);
    }

    #[tokio::test]
    async fn zero_matched_items_is_selector_miss_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nothing here</body></html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let src = source("ex1", server.uri(), "ul.list li");

        let result = crawler.run(&src).await;
        assert_eq!(result.status, CrawlStatus::Failed);
        assert!(result.error_message.unwrap().contains("selector"));
    }

    #[tokio::test]
    async fn consecutive_failures_increment_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let src = source("ex1", "http://127.0.0.1:0/unreachable".to_string(), "ul.list li");

        crawler.run(&src).await;
        let state = crawler.states.get("ex1").await;
        assert_eq!(state.consecutive_failures, 1);
    }
}
