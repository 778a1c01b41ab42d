use crate::dimension::Dimension;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single canonicalized, per-entry record produced by a fetcher (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledItem {
    pub title: String,
    pub url: String,
    /// 64-char lowercase hex SHA-256 of the canonical URL; dedup primary key.
    pub url_hash: String,
    pub published_at: Option<NaiveDate>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub content: String,
    pub content_html: Option<String>,
    /// SHA-256 of whitespace-normalized `content`; `None` iff `content` is empty.
    pub content_hash: Option<String>,
    pub source_id: String,
    pub dimension: Dimension,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Set by the storage layer when writing the raw artifact (spec §3).
    #[serde(default)]
    pub is_new: bool,
}

impl CrawledItem {
    /// Insert or overwrite an extra field (e.g. `pdf_url`, `images`).
    pub fn set_extra(&mut self, key: &str, value: serde_json::Value) {
        self.extra.insert(key.to_string(), value);
    }

    pub fn get_extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }
}
