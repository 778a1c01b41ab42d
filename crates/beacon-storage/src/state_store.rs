//! `source_state.json` (spec §3 SourceState, §4.8, §5, §9): the sole
//! process-wide mutable artifact, guarded by one mutex with read/
//! update-fn access only (spec §9 "Global mutable state").

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::Mutex;

use beacon_types::error::MonitorResult;
use beacon_types::SourceState;

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::paths::source_state_path;

pub struct SourceStateStore {
    path: PathBuf,
    states: Mutex<HashMap<String, SourceState>>,
}

impl SourceStateStore {
    /// Load the existing map from disk, or start empty if none exists.
    pub async fn load(root: impl Into<PathBuf>) -> MonitorResult<Self> {
        let root = root.into();
        let path = source_state_path(&root);
        let states = read_json_opt(&path).await?.unwrap_or_default();
        Ok(Self {
            path,
            states: Mutex::new(states),
        })
    }

    pub async fn get(&self, source_id: &str) -> SourceState {
        self.states.lock().await.get(source_id).cloned().unwrap_or_default()
    }

    pub async fn snapshot(&self) -> HashMap<String, SourceState> {
        self.states.lock().await.clone()
    }

    /// Read-modify-write a single source's state under the mutex, then
    /// atomically persist the whole map (spec §4.8: "read-modify-write
    /// under an in-process mutex; writes are atomic").
    pub async fn update<F>(&self, source_id: &str, f: F) -> MonitorResult<SourceState>
    where
        F: FnOnce(&mut SourceState),
    {
        let mut guard = self.states.lock().await;
        let entry = guard.entry(source_id.to_string()).or_default();
        f(entry);
        let updated = entry.clone();
        write_json_atomic(&self.path, &*guard).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::CrawlStatus;
    use chrono::Utc;

    #[tokio::test]
    async fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = SourceStateStore::load(dir.path()).await.unwrap();
        store
            .update("s1", |state| state.record_run(CrawlStatus::Success, Utc::now()))
            .await
            .unwrap();

        let reloaded = SourceStateStore::load(dir.path()).await.unwrap();
        let state = reloaded.get("s1").await;
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_success_at.is_some());
    }

    #[tokio::test]
    async fn missing_source_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SourceStateStore::load(dir.path()).await.unwrap();
        let state = store.get("never-run").await;
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_crawl_at.is_none());
    }

    #[tokio::test]
    async fn failures_accumulate_across_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = SourceStateStore::load(dir.path()).await.unwrap();
        for _ in 0..3 {
            store
                .update("s1", |state| state.record_run(CrawlStatus::Failed, Utc::now()))
                .await
                .unwrap();
        }
        assert_eq!(store.get("s1").await.consecutive_failures, 3);
    }
}
