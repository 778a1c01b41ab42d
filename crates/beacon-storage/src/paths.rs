//! On-disk layout (spec §3 "Ownership & lifecycle", §6 "State files",
//! §8.4 "Raw artifact write"). Centralized here so every store and the
//! read-side `reader` module agree on where things live.

use std::path::{Path, PathBuf};

use beacon_types::Dimension;

/// `data/raw/{dimension}/{group}/{source_id}/latest.json`. `group` is
/// omitted from the path when absent (spec §4.8).
pub fn raw_artifact_path(root: &Path, dimension: Dimension, group: Option<&str>, source_id: &str) -> PathBuf {
    let mut path = root.join("raw").join(dimension.as_str());
    if let Some(group) = group {
        path = path.join(group);
    }
    path.join(source_id).join("latest.json")
}

pub fn raw_dir(root: &Path) -> PathBuf {
    root.join("raw")
}

/// `data/state/source_state.json` (spec §4.8, §6).
pub fn source_state_path(root: &Path) -> PathBuf {
    root.join("state").join("source_state.json")
}

/// `data/state/snapshots/{source_id}.json` (spec §4.8, §6).
pub fn snapshot_path(root: &Path, source_id: &str) -> PathBuf {
    root.join("state").join("snapshots").join(format!("{source_id}.json"))
}

/// `data/state/article_annotations.json` (spec §6).
pub fn article_annotations_path(root: &Path) -> PathBuf {
    root.join("state").join("article_annotations.json")
}

/// `data/logs/{source_id}/crawl_logs.json` (spec §4.8, §6).
pub fn run_log_path(root: &Path, source_id: &str) -> PathBuf {
    root.join("logs").join(source_id).join("crawl_logs.json")
}

/// `data/index.json`, consumed by the read API (spec §4.10 stage 7).
pub fn index_path(root: &Path) -> PathBuf {
    root.join("index.json")
}

/// `data/pipeline_status.json` (spec §4.10).
pub fn pipeline_status_path(root: &Path) -> PathBuf {
    root.join("pipeline_status.json")
}

/// `data/processed/{module}/{file}`, one directory per domain processor
/// (spec §3 ProcessedFeed, §4.11).
pub fn processed_path(root: &Path, module: &str, file: &str) -> PathBuf {
    root.join("processed").join(module).join(file)
}

/// `data/processed/{module}/_processed_hashes.json`, the `HashTracker`
/// state for one processor (spec §4.11).
pub fn hash_tracker_path(root: &Path, module: &str) -> PathBuf {
    processed_path(root, module, "_processed_hashes.json")
}

/// `data/processed/{module}/_enriched/{item_url_hash}.json`, the oracle
/// enrichment cache (spec §4.11 "Tier 2").
pub fn enriched_cache_path(root: &Path, module: &str, item_url_hash: &str) -> PathBuf {
    processed_path(root, module, "_enriched").join(format!("{item_url_hash}.json"))
}
