//! Raw artifact persistence (spec §3 RawArtifact, §4.8, §8 invariants 1-2).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::instrument;

use beacon_types::error::MonitorResult;
use beacon_types::{CrawledItem, Dimension, RawArtifact};

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::paths::raw_artifact_path;

/// One-writer-many-readers store over `data/raw/{dimension}/{group}/{id}/latest.json`.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read the prior artifact for a source, if any. A corrupted artifact
    /// is surfaced as `IntegrityError` rather than silently treated as
    /// missing, so a caller that wants the "treat as missing" fallback
    /// (spec §7) does so explicitly.
    pub async fn read_latest(
        &self,
        dimension: Dimension,
        group: Option<&str>,
        source_id: &str,
    ) -> MonitorResult<Option<RawArtifact>> {
        let path = raw_artifact_path(&self.root, dimension, group, source_id);
        read_json_opt(&path).await
    }

    /// Build and atomically write a new artifact, marking `is_new` on each
    /// item by diffing against the prior artifact (spec §3, §8 invariant
    /// 2). The prior artifact is read fresh so this is safe to call
    /// without an external lock as long as only one task writes a given
    /// `source_id` concurrently (spec §5: raw artifacts are single-writer).
    #[instrument(skip(self, items), fields(source_id = %source_id, count = items.len()))]
    pub async fn write(
        &self,
        source_id: &str,
        dimension: Dimension,
        group: Option<&str>,
        source_name: &str,
        crawled_at: DateTime<Utc>,
        items: Vec<CrawledItem>,
    ) -> MonitorResult<RawArtifact> {
        let previous = match self.read_latest(dimension, group, source_id).await {
            Ok(prev) => prev,
            Err(_) => None,
        };

        let artifact = RawArtifact::build(
            source_id,
            dimension,
            group.map(|s| s.to_string()),
            source_name,
            crawled_at,
            items,
            previous.as_ref(),
        );

        let path = raw_artifact_path(&self.root, dimension, group, source_id);
        write_json_atomic(&path, &artifact).await?;

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::urlutil::url_hash;

    fn item(url: &str) -> CrawledItem {
        let u = url.to_string();
        CrawledItem {
            title: "t".into(),
            url: u.clone(),
            url_hash: url_hash(&u),
            published_at: None,
            author: None,
            summary: None,
            content: String::new(),
            content_html: None,
            content_hash: None,
            source_id: "s1".into(),
            dimension: Dimension::Technology,
            tags: Default::default(),
            extra: Default::default(),
            is_new: false,
        }
    }

    #[tokio::test]
    async fn first_write_marks_every_item_new() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let artifact = store
            .write("s1", Dimension::Technology, None, "Src", Utc::now(), vec![item("https://x/a")])
            .await
            .unwrap();
        assert_eq!(artifact.new_item_count, 1);
        assert!(artifact.items[0].is_new);
    }

    #[tokio::test]
    async fn second_write_diffs_against_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store
            .write("s1", Dimension::Technology, None, "Src", Utc::now(), vec![item("https://x/a")])
            .await
            .unwrap();
        let second = store
            .write(
                "s1",
                Dimension::Technology,
                None,
                "Src",
                Utc::now(),
                vec![item("https://x/a"), item("https://x/b")],
            )
            .await
            .unwrap();
        assert_eq!(second.new_item_count, 1);
        assert!(!second.items[0].is_new);
        assert!(second.items[1].is_new);
    }

    #[tokio::test]
    async fn group_is_omitted_from_path_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store
            .write("s1", Dimension::Technology, None, "Src", Utc::now(), vec![item("https://x/a")])
            .await
            .unwrap();
        assert!(dir.path().join("raw/technology/s1/latest.json").exists());
    }

    #[tokio::test]
    async fn unchanged_rerun_yields_zero_new_items() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store
            .write("s1", Dimension::Technology, None, "Src", Utc::now(), vec![item("https://x/a")])
            .await
            .unwrap();
        let again = store
            .write("s1", Dimension::Technology, None, "Src", Utc::now(), vec![item("https://x/a")])
            .await
            .unwrap();
        assert_eq!(again.new_item_count, 0);
    }
}
