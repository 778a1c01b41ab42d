use crate::item::CrawledItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome classification for one source run (spec §3 invariants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrawlStatus {
    Success,
    NoNewContent,
    Partial,
    Failed,
}

/// The result of one fetcher run for one source (spec §3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub source_id: String,
    pub status: CrawlStatus,
    pub items_total: usize,
    pub items_new: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub error_message: Option<String>,
    pub items: Vec<CrawledItem>,
}

impl CrawlResult {
    /// Build a result from a completed fetch, classifying status per the
    /// predicates in spec §3: `SUCCESS` iff items exist and nothing errored,
    /// `NO_NEW_CONTENT` iff zero items and nothing errored, `PARTIAL` iff a
    /// mix of successes and non-fatal per-item errors, `FAILED` iff no items
    /// were produced and something errored.
    pub fn classify(
        source_id: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        items: Vec<CrawledItem>,
        items_new: usize,
        had_item_errors: bool,
        fatal_error: Option<String>,
    ) -> Self {
        let items_total = items.len();
        let duration_seconds = (ended_at - started_at).num_milliseconds().max(0) as f64 / 1000.0;

        let status = if let Some(_) = &fatal_error {
            CrawlStatus::Failed
        } else if items_total == 0 {
            CrawlStatus::NoNewContent
        } else if had_item_errors {
            CrawlStatus::Partial
        } else {
            CrawlStatus::Success
        };

        let error_message = fatal_error.or_else(|| {
            if had_item_errors {
                Some("some items failed to fetch or parse".to_string())
            } else {
                None
            }
        });

        CrawlResult {
            source_id: source_id.into(),
            status,
            items_total,
            items_new,
            started_at,
            ended_at,
            duration_seconds,
            error_message,
            items,
        }
    }

    pub fn failed(
        source_id: impl Into<String>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        error_message: impl Into<String>,
    ) -> Self {
        CrawlResult::classify(
            source_id,
            started_at,
            ended_at,
            Vec::new(),
            0,
            false,
            Some(error_message.into()),
        )
    }
}
