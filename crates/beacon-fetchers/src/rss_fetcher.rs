//! The `rss` strategy (spec §4.5): fetch the feed via C1, parse RSS/Atom/RDF
//! with `feed-rs`, map entries to `CrawledItem`, honoring `max_entries`
//! (default 50) and sanitizing any HTML content through C4's sanitizer.

use std::sync::Arc;

use async_trait::async_trait;

use beacon_extract::sanitize_html;
use beacon_http::HttpClient;
use beacon_types::error::{MonitorError, MonitorResult};
use beacon_types::item::CrawledItem;
use beacon_types::source::SourceDefinition;
use beacon_types::urlutil::{content_hash, url_hash};

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::static_fetcher::request_options;

const DEFAULT_MAX_ENTRIES: usize = 50;

pub struct RssFetcher {
    pub http: Arc<HttpClient>,
}

impl RssFetcher {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for RssFetcher {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let options = request_options(source);
        let page = self.http.fetch_page(&source.url, &options).await?;

        let feed = feed_rs::parser::parse(page.body.as_bytes())
            .map_err(|e| MonitorError::decode(&source.url, format!("feed parse failed: {e}")))?;

        let max_entries = source.extras.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES);
        let mut items = Vec::new();
        let mut item_errors = Vec::new();

        for entry in feed.entries.into_iter().take(max_entries) {
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
                item_errors.push("feed entry has no link, skipped".to_string());
                continue;
            };

            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string());

            let summary = entry.summary.as_ref().map(|s| sanitize_html(&s.content));
            let content_html = entry.content.as_ref().and_then(|c| c.body.as_ref()).map(|b| sanitize_html(b));
            let content = content_html
                .as_deref()
                .map(|html| extract_plain_text(html))
                .unwrap_or_default();

            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.date_naive());

            items.push(CrawledItem {
                title,
                url: link.clone(),
                url_hash: url_hash(&link),
                published_at,
                author: entry.authors.first().map(|a| a.name.clone()),
                summary,
                content: content.clone(),
                content_html,
                content_hash: content_hash(&content),
                source_id: source.id.clone(),
                dimension: source.dimension,
                tags: source.tags.iter().cloned().collect(),
                extra: serde_json::Map::new(),
                is_new: false,
            });
        }

        Ok(FetchOutcome { items, item_errors })
    }
}

fn extract_plain_text(html: &str) -> String {
    let doc = scraper::Html::parse_fragment(html);
    doc.root_element().text().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_plain_text_strips_tags() {
        let text = extract_plain_text("<p>Hello <b>world</b></p>");
        assert!(text.contains("Hello"));
        assert!(text.contains("world"));
        assert!(!text.contains('<'));
    }
}
