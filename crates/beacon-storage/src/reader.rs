//! In-memory-filterable read functions over the on-disk layout (spec §6
//! read-API contract; SPEC_FULL.md §6 expansion: "pure functions over the
//! on-disk layout, not a server" that a future HTTP layer calls directly).

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

use beacon_types::error::{MonitorError, MonitorResult};
use beacon_types::{CrawledItem, Dimension, RawArtifact};

use crate::paths::{pipeline_status_path, raw_dir};

/// The common filter set named in spec §6, including the source-filter
/// quadruple used by the per-module intel feed endpoints.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub dimension: Option<Dimension>,
    pub source_id: Option<String>,
    pub source_ids: Vec<String>,
    /// Fuzzy, case-insensitive, whitespace-insensitive substring match
    /// against `source_name` (spec §6).
    pub source_name: Option<String>,
    /// Same fuzzy match as `source_name`, but matches if the artifact's
    /// `source_name` fuzzily contains any one of these (spec §6
    /// source-filter quadruple: `source_id`, `source_ids`, `source_name`,
    /// `source_names`).
    pub source_names: Vec<String>,
    pub keyword: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ArticleFilter {
    fn matches(&self, artifact: &RawArtifact) -> bool {
        if let Some(dimension) = self.dimension {
            if artifact.dimension != dimension {
                return false;
            }
        }
        if let Some(source_id) = &self.source_id {
            if &artifact.source_id != source_id {
                return false;
            }
        }
        if !self.source_ids.is_empty() && !self.source_ids.contains(&artifact.source_id) {
            return false;
        }
        if let Some(name) = &self.source_name {
            let needle = normalize_for_fuzzy_match(name);
            if !normalize_for_fuzzy_match(&artifact.source_name).contains(&needle) {
                return false;
            }
        }
        if !self.source_names.is_empty() {
            let haystack = normalize_for_fuzzy_match(&artifact.source_name);
            let matches = self
                .source_names
                .iter()
                .any(|name| haystack.contains(&normalize_for_fuzzy_match(name)));
            if !matches {
                return false;
            }
        }
        true
    }

    fn item_matches(&self, item: &CrawledItem) -> bool {
        if let Some(keyword) = &self.keyword {
            let keyword = keyword.to_lowercase();
            let haystack = format!("{} {}", item.title, item.content).to_lowercase();
            if !haystack.contains(&keyword) {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if item.published_at.map(|d| d < from).unwrap_or(true) {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if item.published_at.map(|d| d > to).unwrap_or(true) {
                return false;
            }
        }
        true
    }
}

/// `source_name` matching is whitespace- and case-insensitive (spec §6).
fn normalize_for_fuzzy_match(s: &str) -> String {
    s.split_whitespace().collect::<String>().to_lowercase()
}

/// Walk `data/raw` and read every `latest.json` artifact.
fn read_all_artifacts(root: &Path) -> MonitorResult<Vec<RawArtifact>> {
    let mut artifacts = Vec::new();
    let mut stack = vec![raw_dir(root)];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(MonitorError::storage(dir.display().to_string(), e.to_string())),
        };

        for entry in entries {
            let entry = entry.map_err(|e| MonitorError::storage(dir.display().to_string(), e.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.file_name().and_then(|n| n.to_str()) == Some("latest.json") {
                let bytes = std::fs::read(&path).map_err(|e| MonitorError::storage(path.display().to_string(), e.to_string()))?;
                match serde_json::from_slice::<RawArtifact>(&bytes) {
                    Ok(artifact) => artifacts.push(artifact),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping corrupted raw artifact");
                    }
                }
            }
        }
    }

    Ok(artifacts)
}

/// Articles list endpoint (spec §6): filter across every source's latest
/// artifact, flatten to items, apply paging.
pub fn list_articles(root: &Path, filter: &ArticleFilter) -> MonitorResult<Vec<CrawledItem>> {
    let mut items: Vec<CrawledItem> = read_all_artifacts(root)?
        .into_iter()
        .filter(|a| filter.matches(a))
        .flat_map(|a| a.items)
        .filter(|i| filter.item_matches(i))
        .collect();

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let start = filter.offset.min(items.len());
    let end = match filter.limit {
        Some(limit) => (start + limit).min(items.len()),
        None => items.len(),
    };
    Ok(items[start..end].to_vec())
}

/// Per-dimension counts and last-updated timestamp (spec §6 "Dimension
/// overview").
#[derive(Debug, Clone, serde::Serialize)]
pub struct DimensionOverview {
    pub dimension: Dimension,
    pub article_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

pub fn dimension_overview(root: &Path) -> MonitorResult<Vec<DimensionOverview>> {
    let artifacts = read_all_artifacts(root)?;
    let mut overview: Vec<DimensionOverview> = Dimension::ALL
        .into_iter()
        .map(|dimension| DimensionOverview {
            dimension,
            article_count: 0,
            last_updated: None,
        })
        .collect();

    for artifact in artifacts {
        if let Some(entry) = overview.iter_mut().find(|o| o.dimension == artifact.dimension) {
            entry.article_count += artifact.item_count;
            entry.last_updated = match entry.last_updated {
                Some(existing) if existing >= artifact.crawled_at => Some(existing),
                _ => Some(artifact.crawled_at),
            };
        }
    }

    Ok(overview)
}

/// Health bucket counts (spec §7: `consecutive_failures >= 3 -> failing`).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct HealthSummary {
    pub healthy: usize,
    pub warning: usize,
    pub failing: usize,
}

pub fn summarize_health<'a>(states: impl IntoIterator<Item = &'a beacon_types::SourceState>) -> HealthSummary {
    let mut summary = HealthSummary::default();
    for state in states {
        match state.health() {
            beacon_types::SourceHealth::Healthy => summary.healthy += 1,
            beacon_types::SourceHealth::Warning => summary.warning += 1,
            beacon_types::SourceHealth::Failing => summary.failing += 1,
        }
    }
    summary
}

/// Read the latest orchestrator summary written by the pipeline (spec
/// §4.10, §6 "pipeline status").
pub fn latest_pipeline_status(root: &Path) -> MonitorResult<Option<serde_json::Value>> {
    let path = pipeline_status_path(root);
    match std::fs::read(&path) {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| MonitorError::integrity(format!("corrupted pipeline status: {e}"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MonitorError::storage(path.display().to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_types::urlutil::url_hash;

    fn item(title: &str, published: Option<NaiveDate>) -> CrawledItem {
        let url = format!("https://x/{title}");
        CrawledItem {
            title: title.to_string(),
            url: url.clone(),
            url_hash: url_hash(&url),
            published_at: published,
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

    fn write_artifact(root: &Path, source_id: &str, source_name: &str, items: Vec<CrawledItem>) {
        let artifact = RawArtifact::build(
            source_id,
            Dimension::Technology,
            None,
            source_name,
            Utc::now(),
            items,
            None,
        );
        let path = root
            .join("raw")
            .join("technology")
            .join(source_id)
            .join("latest.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec(&artifact).unwrap()).unwrap();
    }

    #[test]
    fn filters_by_source_name_fuzzily() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "s1", "Ministry  of Tech", vec![item("a", None)]);
        let filter = ArticleFilter {
            source_name: Some("ministryoftech".to_string()),
            ..Default::default()
        };
        let items = list_articles(dir.path(), &filter).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn filters_by_source_names_list_fuzzily() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "s1", "Ministry of Tech", vec![item("a", None)]);
        write_artifact(dir.path(), "s2", "Bureau of Talent", vec![item("b", None)]);
        write_artifact(dir.path(), "s3", "Sports Desk", vec![item("c", None)]);
        let filter = ArticleFilter {
            source_names: vec!["ministryoftech".to_string(), "bureauoftalent".to_string()],
            ..Default::default()
        };
        let mut items = list_articles(dir.path(), &filter).unwrap();
        items.sort_by(|a, b| a.title.cmp(&b.title));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "a");
        assert_eq!(items[1].title, "b");
    }

    #[test]
    fn filters_by_keyword() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "s1", "Src", vec![item("Policy Update", None), item("Sports", None)]);
        let filter = ArticleFilter {
            keyword: Some("policy".to_string()),
            ..Default::default()
        };
        let items = list_articles(dir.path(), &filter).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Policy Update");
    }

    #[test]
    fn paging_respects_limit_and_offset() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(
            dir.path(),
            "s1",
            "Src",
            vec![item("a", None), item("b", None), item("c", None)],
        );
        let filter = ArticleFilter {
            limit: Some(1),
            offset: 1,
            ..Default::default()
        };
        let items = list_articles(dir.path(), &filter).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn dimension_overview_counts_items() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "s1", "Src", vec![item("a", None), item("b", None)]);
        let overview = dimension_overview(dir.path()).unwrap();
        let tech = overview.iter().find(|o| o.dimension == Dimension::Technology).unwrap();
        assert_eq!(tech.article_count, 2);
    }

    #[test]
    fn health_summary_buckets_by_threshold() {
        use beacon_types::SourceState;
        let mut failing = SourceState::default();
        failing.consecutive_failures = 3;
        let healthy = SourceState::default();
        let summary = summarize_health([&failing, &healthy]);
        assert_eq!(summary.failing, 1);
        assert_eq!(summary.healthy, 1);
    }
}
