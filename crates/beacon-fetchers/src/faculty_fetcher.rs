//! The `faculty` strategy (spec §4.5): a roster-oriented extension of
//! `static` that parses person-cards into structured fields (name,
//! position, bio, email, photo_url, research_areas), with optional
//! pagination up to `extras.max_pages`.
//!
//! Person cards are extracted by running the ordinary C4 list pass for the
//! card boundary (`list_selectors.list_item`/`title`/`link`), then running
//! a detail pass over each card's own HTML fragment (wrapped as a
//! synthetic document) using the configured `heading_sections` and
//! `label_prefix_sections` to pull out the structured fields, exactly as a
//! detail page would.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use beacon_extract::{extract_detail, extract_list_with_fragments};
use beacon_http::HttpClient;
use beacon_types::error::MonitorResult;
use beacon_types::item::CrawledItem;
use beacon_types::source::{normalize_base_url, DetailSelectors, SourceDefinition};
use beacon_types::urlutil::url_hash;

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::static_fetcher::request_options;

const DEFAULT_MAX_PAGES: u32 = 1;

pub struct FacultyFetcher {
    pub http: Arc<HttpClient>,
}

impl FacultyFetcher {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    fn page_url(base: &str, page: u32) -> String {
        if page <= 1 {
            return base.to_string();
        }
        if base.contains('?') {
            format!("{base}&page={page}")
        } else {
            format!("{base}?page={page}")
        }
    }
}

#[async_trait]
impl Fetcher for FacultyFetcher {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let options = request_options(source);
        let base_url = source
            .normalized_base_url()
            .unwrap_or_else(|| normalize_base_url(&source.url));
        let max_pages = source.extras.max_pages.unwrap_or(DEFAULT_MAX_PAGES).max(1);

        let mut items = Vec::new();
        let mut item_errors = Vec::new();

        for page_number in 1..=max_pages {
            let page_url = Self::page_url(&source.url, page_number);
            let page = match self.http.fetch_page(&page_url, &options).await {
                Ok(p) => p,
                Err(e) => {
                    item_errors.push(format!("{page_url}: fetch failed: {e}"));
                    break;
                }
            };

            let keyword_filter = source.effective_keyword_filter().unwrap_or(&[]);
            let cards = extract_list_with_fragments(&page.body, &source.list_selectors, &base_url, keyword_filter)?;
            if cards.is_empty() {
                break;
            }

            for (card, fragment) in cards {
                let mut extra = serde_json::Map::new();

                if let Some(detail_selectors) = &source.detail_selectors {
                    let card_detail_selectors = DetailSelectors {
                        content: Some("body".to_string()),
                        ..detail_selectors.clone()
                    };
                    if let Ok(detail) = extract_detail(&fragment, &card_detail_selectors, &base_url) {
                        for (field, value) in detail.heading_sections.into_iter().chain(detail.label_prefix_sections) {
                            extra.insert(field, json!(value));
                        }
                        if let Some(photo) = detail.images.first() {
                            extra.insert("photo_url".to_string(), json!(photo.src));
                        }
                    }
                }

                items.push(CrawledItem {
                    title: card.title,
                    url: card.absolute_url.clone(),
                    url_hash: url_hash(&card.absolute_url),
                    published_at: None,
                    author: None,
                    summary: None,
                    content: String::new(),
                    content_html: None,
                    content_hash: None,
                    source_id: source.id.clone(),
                    dimension: source.dimension,
                    tags: source.tags.iter().cloned().collect(),
                    extra,
                    is_new: false,
                });
            }
        }

        Ok(FetchOutcome { items, item_errors })
    }
}
