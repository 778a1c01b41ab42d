//! `HashTracker` (spec §4.11): per-module `_processed_hashes.json`, a map
//! `item_url_hash -> processing_content_hash`. An item is "new or changed"
//! iff its current `content_hash` differs from (or is absent from) the
//! stored map — the same shape as `beacon-types::state::SourceState`'s
//! change detection, applied at the processor layer instead of the crawl
//! layer.

use std::collections::HashMap;
use std::path::PathBuf;

use beacon_storage::atomic::{read_json_opt, write_json_atomic};
use beacon_storage::paths::hash_tracker_path;
use beacon_types::error::MonitorResult;

pub struct HashTracker {
    path: PathBuf,
    seen: HashMap<String, String>,
    dirty: bool,
}

impl HashTracker {
    pub async fn load(data_root: &std::path::Path, module: &str) -> MonitorResult<Self> {
        let path = hash_tracker_path(data_root, module);
        let seen = read_json_opt(&path).await?.unwrap_or_default();
        Ok(Self {
            path,
            seen,
            dirty: false,
        })
    }

    /// True when `item_url_hash` has never been seen, or was seen with a
    /// different `content_hash`. `force` always reports true without
    /// consulting the map.
    pub fn is_new_or_changed(&self, item_url_hash: &str, content_hash: &str, force: bool) -> bool {
        if force {
            return true;
        }
        match self.seen.get(item_url_hash) {
            Some(prior) => prior != content_hash,
            None => true,
        }
    }

    /// Records the processed content hash. No-op (and does not mark the
    /// tracker dirty) under `dry_run` — a dry run must not mutate state.
    pub fn mark_processed(&mut self, item_url_hash: &str, content_hash: &str, dry_run: bool) {
        if dry_run {
            return;
        }
        self.seen.insert(item_url_hash.to_string(), content_hash.to_string());
        self.dirty = true;
    }

    pub async fn save(&self) -> MonitorResult<()> {
        if !self.dirty {
            return Ok(());
        }
        write_json_atomic(&self.path, &self.seen).await
    }
}
