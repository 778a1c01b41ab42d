//! Per-source bounded run logs (spec §3 RunLog, §4.8, §8 "Cap of 100").

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use beacon_types::error::MonitorResult;
use beacon_types::{push_bounded, RunLogEntry};

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::paths::run_log_path;

/// Serializes appends per source id (spec §5 "crawl_logs.json per source:
/// serialized by a per-source mutex").
pub struct LogStore {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LogStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, source_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(source_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn append(&self, source_id: &str, entry: RunLogEntry) -> MonitorResult<Vec<RunLogEntry>> {
        let lock = self.lock_for(source_id);
        let _guard = lock.lock().await;

        let path = run_log_path(&self.root, source_id);
        let mut log: Vec<RunLogEntry> = read_json_opt(&path).await?.unwrap_or_default();
        push_bounded(&mut log, entry);
        write_json_atomic(&path, &log).await?;
        Ok(log)
    }

    pub async fn read(&self, source_id: &str) -> MonitorResult<Vec<RunLogEntry>> {
        let path = run_log_path(&self.root, source_id);
        Ok(read_json_opt(&path).await?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::CrawlStatus;
    use chrono::Utc;

    fn entry() -> RunLogEntry {
        RunLogEntry {
            timestamp: Utc::now(),
            status: CrawlStatus::Success,
            items_total: 1,
            items_new: 1,
            duration_seconds: 0.1,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn appends_and_caps_at_100() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path());
        for _ in 0..105 {
            store.append("s1", entry()).await.unwrap();
        }
        let log = store.read("s1").await.unwrap();
        assert_eq!(log.len(), 100);
    }

    #[tokio::test]
    async fn reads_empty_for_unknown_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path());
        assert!(store.read("never-run").await.unwrap().is_empty());
    }
}
