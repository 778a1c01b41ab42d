//! The `snapshot` strategy (spec §4.5): hash a sub-DOM, diff against the
//! most recent capture, and emit at most one `CrawledItem` per run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use scraper::{Html, Selector};

use beacon_http::HttpClient;
use beacon_types::artifact::SnapshotStore;
use beacon_types::error::{MonitorError, MonitorResult};
use beacon_types::item::CrawledItem;
use beacon_types::source::SourceDefinition;
use beacon_types::urlutil::{content_hash, snapshot_url, url_hash};
use beacon_types::SnapshotRecord;

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::static_fetcher::request_options;

pub struct SnapshotFetcher {
    pub http: Arc<HttpClient>,
    pub store: Arc<dyn SnapshotStore>,
}

impl SnapshotFetcher {
    pub fn new(http: Arc<HttpClient>, store: Arc<dyn SnapshotStore>) -> Self {
        Self { http, store }
    }
}

#[async_trait]
impl Fetcher for SnapshotFetcher {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let options = request_options(source);
        let page = self.http.fetch_page(&source.url, &options).await?;

        let sub_dom_text = match &source.extras.content_area {
            Some(selector_str) => {
                let document = Html::parse_document(&page.body);
                let selector = Selector::parse(selector_str)
                    .map_err(|e| MonitorError::configuration_field(format!("invalid content_area selector: {e:?}"), selector_str))?;
                document
                    .select(&selector)
                    .next()
                    .map(|el| el.text().collect::<Vec<_>>().join("\n"))
                    .unwrap_or_default()
            }
            None => {
                let document = Html::parse_document(&page.body);
                document.root_element().text().collect::<Vec<_>>().join("\n")
            }
        };

        let stripped = strip_ignore_patterns(&sub_dom_text, &source.extras.ignore_patterns);
        let Some(hash) = content_hash(&stripped) else {
            return Ok(FetchOutcome::default());
        };

        let previous = self.store.latest(&source.id).await?;
        if let Some(prev) = &previous {
            if prev.content_hash == hash {
                return Ok(FetchOutcome::default());
            }
        }

        let diff_summary = match &previous {
            Some(prev) => diff_lines(&prev.captured_text, &stripped),
            None => format!("initial capture, {} chars", stripped.len()),
        };

        self.store
            .append(
                &source.id,
                SnapshotRecord {
                    captured_at: Utc::now(),
                    content_hash: hash.clone(),
                    content_length: stripped.len(),
                    diff_summary: Some(diff_summary.clone()),
                    captured_text: stripped.clone(),
                },
            )
            .await?;

        let item_url = snapshot_url(&source.url, &hash);
        let item = CrawledItem {
            title: source.name.clone(),
            url: item_url.clone(),
            url_hash: url_hash(&item_url),
            published_at: Some(Utc::now().date_naive()),
            author: None,
            summary: None,
            content: diff_summary,
            content_html: None,
            content_hash: Some(hash),
            source_id: source.id.clone(),
            dimension: source.dimension,
            tags: source.tags.iter().cloned().collect(),
            extra: serde_json::Map::new(),
            is_new: false,
        };

        Ok(FetchOutcome {
            items: vec![item],
            item_errors: Vec::new(),
        })
    }
}

fn strip_ignore_patterns(text: &str, patterns: &[String]) -> String {
    let mut out = text.to_string();
    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    out
}

/// Line-level diff summary between the prior and current capture (spec
/// §4.5: "the diff summary (line-level additions/deletions)"). Lines are
/// the text-node fragments of the captured sub-DOM; each one is compared
/// by membership, not position, so reordering existing lines isn't reported
/// as a change.
fn diff_lines(previous: &str, current: &str) -> String {
    let prev_lines: std::collections::HashSet<&str> =
        previous.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let cur_lines: Vec<&str> = current.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let cur_set: std::collections::HashSet<&str> = cur_lines.iter().copied().collect();

    let mut entries: Vec<String> = Vec::new();
    let mut seen_added: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for line in &cur_lines {
        if !prev_lines.contains(line) && seen_added.insert(line) {
            entries.push(format!("+ {line}"));
        }
    }
    let mut seen_removed: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for line in previous.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !cur_set.contains(line) && seen_removed.insert(line) {
            entries.push(format!("- {line}"));
        }
    }

    if entries.is_empty() {
        format!("content changed, {} chars in new capture", current.len())
    } else {
        entries.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_configured_patterns() {
        let out = strip_ignore_patterns("visits: 1234 today", &["visits: \\d+".to_string()]);
        assert_eq!(out.trim(), "today");
    }

    #[test]
    fn diff_lines_reports_additions_and_removals() {
        let summary = diff_lines("A: Smith", "A: Smith\nB: Jones");
        assert!(summary.contains("+ B: Jones"), "{summary}");
        assert!(!summary.contains("A: Smith"), "{summary}");
    }

    #[test]
    fn diff_lines_reports_removal() {
        let summary = diff_lines("A: Smith\nB: Jones", "A: Smith");
        assert!(summary.contains("- B: Jones"), "{summary}");
    }

    #[test]
    fn diff_lines_falls_back_when_no_line_change_detected() {
        let summary = diff_lines("A: Smith", "A: Smith ");
        assert!(summary.contains("chars in new capture"));
    }
}
