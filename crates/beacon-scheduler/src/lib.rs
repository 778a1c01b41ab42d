//! Scheduling layer (spec §4.9, C9): registers one periodic task per
//! catalog source against the crawl base protocol (C7), smears the
//! daily/weekly/monthly cron tiers with registration jitter, and governs
//! concurrency with a global cap plus a per-source `max_instances: 1`
//! guard.

pub mod error;
pub mod jitter;
pub mod scheduler;

pub use error::SchedulerError;
pub use scheduler::{Scheduler, SchedulerConfig};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use beacon_browser::{BrowserContext, HeadlessBrowserProvider};
    use beacon_crawl::Crawler;
    use beacon_fetchers::FetcherRegistry;
    use beacon_http::HttpClient;
    use beacon_storage::{ArtifactStore, LogStore, SourceStateStore};
    use beacon_types::artifact::SnapshotStore as SnapshotStoreTrait;
    use beacon_types::error::{MonitorError, MonitorResult};
    use beacon_types::{CrawlStatus, Dimension, FetchStrategy, ListSelectors, Schedule, SnapshotRecord, SourceDefinition};

    use super::*;

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

    fn source(id: &str, url: String, schedule: Schedule) -> SourceDefinition {
        SourceDefinition {
            id: id.to_string(),
            name: "Example".into(),
            dimension: Dimension::Technology,
            group: None,
            url,
            fetch_strategy: Some(FetchStrategy::Static),
            parser_kind: None,
            schedule,
            enabled: true,
            priority: 0,
            list_selectors: ListSelectors {
                list_item: "ul.list li".to_string(),
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

    async fn crawler(dir: &std::path::Path) -> Arc<Crawler> {
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
        Arc::new(Crawler::new(registry, artifacts, states, logs))
    }

    #[tokio::test]
    async fn manual_trigger_runs_and_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<ul class="list"><li><a href="/a">First</a></li></ul>"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let src = source("ex1", server.uri(), Schedule::Daily);

        let scheduler = Arc::new(Scheduler::new(
            vec![src],
            crawler,
            SchedulerConfig::default(),
            dir.path(),
        ));

        let result = scheduler.trigger("ex1").await.unwrap();
        assert_eq!(result.status, CrawlStatus::Success);
    }

    #[tokio::test]
    async fn unknown_source_id_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let scheduler = Arc::new(Scheduler::new(vec![], crawler, SchedulerConfig::default(), dir.path()));
        assert!(scheduler.trigger("missing").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_trigger_of_same_source_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(200))
                    .set_body_string(r#"<ul class="list"><li><a href="/a">First</a></li></ul>"#),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let src = source("ex1", server.uri(), Schedule::Daily);
        let scheduler = Arc::new(Scheduler::new(
            vec![src],
            crawler,
            SchedulerConfig::default(),
            dir.path(),
        ));

        let s1 = Arc::clone(&scheduler);
        let first = tokio::spawn(async move { s1.trigger("ex1").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = scheduler.trigger("ex1").await;
        assert!(second.is_none());
        assert!(first.await.unwrap().is_some());
    }

    #[tokio::test]
    async fn start_primes_empty_catalog_then_stop_drains_cleanly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<ul class="list"><li><a href="/a">First</a></li></ul>"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let crawler = crawler(dir.path()).await;
        let src = source("ex1", server.uri(), Schedule::TwoHours);
        let mut config = SchedulerConfig::default();
        config.shutdown_drain_timeout = Duration::from_millis(500);
        let scheduler = Arc::new(Scheduler::new(vec![src], crawler, config, dir.path()));

        scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.stop().await;
        assert!(!scheduler.is_running());

        let artifact = std::fs::read_dir(dir.path().join("raw")).unwrap().count();
        assert!(artifact >= 1);
    }
}
