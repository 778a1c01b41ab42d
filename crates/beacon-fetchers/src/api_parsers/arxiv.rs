//! ArXiv parser (spec §4.5): one Atom API call, map `<entry>`s. Reuses
//! `feed-rs`'s Atom support since the arXiv export API is itself Atom.

use std::sync::Arc;

use async_trait::async_trait;

use beacon_http::HttpClient;
use beacon_types::error::{MonitorError, MonitorResult};
use beacon_types::item::CrawledItem;
use beacon_types::source::SourceDefinition;
use beacon_types::urlutil::{content_hash, url_hash};

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::static_fetcher::request_options;

pub struct ArxivParser {
    pub http: Arc<HttpClient>,
}

impl ArxivParser {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for ArxivParser {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let options = request_options(source);
        let page = self.http.fetch_page(&source.url, &options).await?;

        let feed = feed_rs::parser::parse(page.body.as_bytes())
            .map_err(|e| MonitorError::decode(&source.url, format!("arxiv atom parse failed: {e}")))?;

        let items = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let link = entry.links.first()?.href.clone();
                let title = entry
                    .title
                    .map(|t| t.content.split_whitespace().collect::<Vec<_>>().join(" "))
                    .unwrap_or_else(|| "Untitled".to_string());
                let summary = entry.summary.map(|s| s.content);
                let content = summary.clone().unwrap_or_default();
                Some(CrawledItem {
                    title,
                    url: link.clone(),
                    url_hash: url_hash(&link),
                    published_at: entry.published.or(entry.updated).map(|d| d.date_naive()),
                    author: entry.authors.first().map(|a| a.name.clone()),
                    summary,
                    content: content.clone(),
                    content_html: None,
                    content_hash: content_hash(&content),
                    source_id: source.id.clone(),
                    dimension: source.dimension,
                    tags: source.tags.iter().cloned().collect(),
                    extra: serde_json::Map::new(),
                    is_new: false,
                })
            })
            .collect();

        Ok(FetchOutcome {
            items,
            item_errors: Vec::new(),
        })
    }
}
