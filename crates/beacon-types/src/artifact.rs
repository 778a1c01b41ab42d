use crate::dimension::Dimension;
use crate::item::CrawledItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The on-disk shape of `data/raw/{dimension}/{group}/{source_id}/latest.json`
/// (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawArtifact {
    pub source_id: String,
    pub dimension: Dimension,
    pub group: Option<String>,
    pub source_name: String,
    pub crawled_at: DateTime<Utc>,
    pub previous_crawled_at: Option<DateTime<Utc>>,
    pub item_count: usize,
    pub new_item_count: usize,
    pub items: Vec<CrawledItem>,
}

impl RawArtifact {
    /// Build a fresh artifact, marking `is_new` on each item by comparing
    /// against the set of hashes in the prior artifact, per spec §3's
    /// invariant: `is_new` is true for every item iff there was no prior
    /// artifact.
    pub fn build(
        source_id: impl Into<String>,
        dimension: Dimension,
        group: Option<String>,
        source_name: impl Into<String>,
        crawled_at: DateTime<Utc>,
        mut items: Vec<CrawledItem>,
        previous: Option<&RawArtifact>,
    ) -> Self {
        let prev_hashes: HashSet<&str> = previous
            .map(|p| p.items.iter().map(|i| i.url_hash.as_str()).collect())
            .unwrap_or_default();

        for item in items.iter_mut() {
            item.is_new = !prev_hashes.contains(item.url_hash.as_str());
        }

        let new_item_count = items.iter().filter(|i| i.is_new).count();

        RawArtifact {
            source_id: source_id.into(),
            dimension,
            group,
            source_name: source_name.into(),
            crawled_at,
            previous_crawled_at: previous.map(|p| p.crawled_at),
            item_count: items.len(),
            new_item_count,
            items,
        }
    }

    pub fn url_hashes(&self) -> HashSet<&str> {
        self.items.iter().map(|i| i.url_hash.as_str()).collect()
    }
}

/// One captured version of a `snapshot`-strategy source (spec §3, §4.5).
///
/// `captured_text` retains the flattened sub-DOM text of this capture so the
/// *next* run can compute a real line-level diff against it; without it only
/// the hash/length of history would survive and no line diff is computable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub captured_at: DateTime<Utc>,
    pub content_hash: String,
    pub content_length: usize,
    pub diff_summary: Option<String>,
    #[serde(default)]
    pub captured_text: String,
}

/// Read/append access to `data/state/snapshots/{source_id}.json` (spec
/// §4.8). Lives in `beacon-types` rather than `beacon-storage` so both the
/// `snapshot` fetcher and the storage layer can depend on the trait without
/// the fetcher crate depending on the whole storage crate.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn latest(&self, source_id: &str) -> crate::error::MonitorResult<Option<SnapshotRecord>>;
    async fn append(&self, source_id: &str, record: SnapshotRecord) -> crate::error::MonitorResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Dimension;

    fn item(hash: &str) -> CrawledItem {
        CrawledItem {
            title: "t".into(),
            url: "https://x/".into(),
            url_hash: hash.into(),
            published_at: None,
            author: None,
            summary: None,
            content: String::new(),
            content_html: None,
            content_hash: None,
            source_id: "s".into(),
            dimension: Dimension::Technology,
            tags: Default::default(),
            extra: Default::default(),
            is_new: false,
        }
    }

    #[test]
    fn no_prior_artifact_marks_every_item_new() {
        let artifact = RawArtifact::build(
            "s",
            Dimension::Technology,
            None,
            "Src",
            Utc::now(),
            vec![item("a"), item("b")],
            None,
        );
        assert!(artifact.items.iter().all(|i| i.is_new));
        assert_eq!(artifact.new_item_count, 2);
    }

    #[test]
    fn items_seen_before_are_not_new() {
        let prior = RawArtifact::build(
            "s",
            Dimension::Technology,
            None,
            "Src",
            Utc::now(),
            vec![item("a")],
            None,
        );
        let next = RawArtifact::build(
            "s",
            Dimension::Technology,
            None,
            "Src",
            Utc::now(),
            vec![item("a"), item("b")],
            Some(&prior),
        );
        assert!(!next.items[0].is_new);
        assert!(next.items[1].is_new);
        assert_eq!(next.new_item_count, 1);
    }

    #[test]
    fn unique_url_hashes_within_one_artifact() {
        let artifact = RawArtifact::build(
            "s",
            Dimension::Technology,
            None,
            "Src",
            Utc::now(),
            vec![item("a"), item("b"), item("c")],
            None,
        );
        let unique: HashSet<_> = artifact.items.iter().map(|i| &i.url_hash).collect();
        assert_eq!(unique.len(), artifact.items.len());
    }
}
