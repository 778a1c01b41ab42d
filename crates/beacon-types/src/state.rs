use crate::result::CrawlStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Process-wide mutable state tracked per source (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceState {
    pub last_crawl_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub is_enabled_override: Option<bool>,
}

impl SourceState {
    /// Fold in the outcome of one run (spec §5, §7).
    pub fn record_run(&mut self, status: CrawlStatus, at: DateTime<Utc>) {
        self.last_crawl_at = Some(at);
        match status {
            CrawlStatus::Success | CrawlStatus::NoNewContent | CrawlStatus::Partial => {
                self.last_success_at = Some(at);
                self.consecutive_failures = 0;
            }
            CrawlStatus::Failed => {
                self.consecutive_failures += 1;
            }
        }
    }

    /// Health bucket using the `consecutive_failures >= 3 → failing`
    /// threshold from spec §7.
    pub fn health(&self) -> SourceHealth {
        match self.consecutive_failures {
            0 => SourceHealth::Healthy,
            1..=2 => SourceHealth::Warning,
            _ => SourceHealth::Failing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHealth {
    Healthy,
    Warning,
    Failing,
}

/// One entry in a source's bounded run log (spec §3, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Utc>,
    pub status: CrawlStatus,
    pub items_total: usize,
    pub items_new: usize,
    pub duration_seconds: f64,
    pub error_message: Option<String>,
}

/// Maximum number of entries kept per source (spec §3, §8).
pub const RUN_LOG_CAP: usize = 100;

/// Append an entry to a run log, dropping the oldest once the cap is
/// exceeded (spec §8: "inserting the 101st entry drops the oldest").
pub fn push_bounded(log: &mut Vec<RunLogEntry>, entry: RunLogEntry) {
    log.push(entry);
    if log.len() > RUN_LOG_CAP {
        let overflow = log.len() - RUN_LOG_CAP;
        log.drain(0..overflow);
    }
}

/// Read-only annotation maintained by the (out-of-core-scope) read API
/// (spec §6). Modeled here purely so the storage layer lays the file out
/// correctly for a future API to read and write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleAnnotation {
    #[serde(default)]
    pub is_read: bool,
    pub importance: Option<String>,
}
