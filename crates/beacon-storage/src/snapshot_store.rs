//! `data/state/snapshots/{source_id}.json` (spec §3 Snapshot, §4.5, §4.8):
//! implements `beacon_types::SnapshotStore` so the `snapshot` fetcher
//! strategy can depend on the trait without a direct dependency on this
//! crate (see `beacon-types::artifact` module docs).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use beacon_types::artifact::SnapshotStore;
use beacon_types::error::MonitorResult;
use beacon_types::SnapshotRecord;

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::paths::snapshot_path;

pub struct FileSnapshotStore {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileSnapshotStore {
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
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn latest(&self, source_id: &str) -> MonitorResult<Option<SnapshotRecord>> {
        let path = snapshot_path(&self.root, source_id);
        let records: Vec<SnapshotRecord> = read_json_opt(&path).await?.unwrap_or_default();
        Ok(records.into_iter().last())
    }

    async fn append(&self, source_id: &str, record: SnapshotRecord) -> MonitorResult<()> {
        let lock = self.lock_for(source_id);
        let _guard = lock.lock().await;

        let path = snapshot_path(&self.root, source_id);
        let mut records: Vec<SnapshotRecord> = read_json_opt(&path).await?.unwrap_or_default();
        records.push(record);
        write_json_atomic(&path, &records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(hash: &str) -> SnapshotRecord {
        SnapshotRecord {
            captured_at: Utc::now(),
            content_hash: hash.to_string(),
            content_length: 10,
            diff_summary: None,
            captured_text: String::new(),
        }
    }

    #[tokio::test]
    async fn latest_is_none_before_any_capture() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(store.latest("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_reflects_most_recent_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store.append("s1", record("h1")).await.unwrap();
        store.append("s1", record("h2")).await.unwrap();
        let latest = store.latest("s1").await.unwrap().unwrap();
        assert_eq!(latest.content_hash, "h2");
    }
}
