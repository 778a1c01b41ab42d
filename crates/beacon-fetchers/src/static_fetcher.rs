//! The `static` strategy (spec §4.5): GET the list page via C1, run C4 list
//! extraction, then GET+extract each item's detail page when configured.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use beacon_extract::{extract_detail, extract_list};
use beacon_http::{FetchOptions, HttpClient};
use beacon_types::error::MonitorResult;
use beacon_types::item::CrawledItem;
use beacon_types::source::{normalize_base_url, SourceDefinition};
use beacon_types::urlutil::url_hash;

use crate::fetcher::{FetchOutcome, Fetcher};

pub struct StaticFetcher {
    pub http: Arc<HttpClient>,
}

impl StaticFetcher {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let options = request_options(source);
        let base_url = source
            .normalized_base_url()
            .unwrap_or_else(|| normalize_base_url(&source.url));

        let page = self.http.fetch_page(&source.url, &options).await?;
        let keyword_filter = source.effective_keyword_filter().unwrap_or(&[]);
        let list_entries = extract_list(&page.body, &source.list_selectors, &base_url, keyword_filter)?;

        let mut items = Vec::with_capacity(list_entries.len());
        let mut item_errors = Vec::new();

        for entry in list_entries {
            let mut item = CrawledItem {
                title: entry.title,
                url: entry.absolute_url.clone(),
                url_hash: url_hash(&entry.absolute_url),
                published_at: entry.published_at,
                author: None,
                summary: None,
                content: String::new(),
                content_html: None,
                content_hash: None,
                source_id: source.id.clone(),
                dimension: source.dimension,
                tags: source.tags.iter().cloned().collect(),
                extra: serde_json::Map::new(),
                is_new: false,
            };

            if let Some(detail_selectors) = &source.detail_selectors {
                if detail_selectors.content.is_some() {
                    match self.http.fetch_page(&entry.absolute_url, &options).await {
                        Ok(detail_page) => match extract_detail(&detail_page.body, detail_selectors, &base_url) {
                            Ok(detail) => {
                                item.content = detail.content;
                                item.content_html = detail.content_html;
                                item.content_hash = detail.content_hash;
                                item.author = detail.author.or(item.author);
                                if !detail.images.is_empty() {
                                    let images: Vec<_> = detail
                                        .images
                                        .iter()
                                        .map(|i| json!({"src": i.src, "alt": i.alt}))
                                        .collect();
                                    item.set_extra("images", json!(images));
                                }
                                if let Some(pdf) = detail.pdf_url {
                                    item.set_extra("pdf_url", json!(pdf));
                                }
                                for (field, value) in detail.heading_sections.into_iter().chain(detail.label_prefix_sections) {
                                    item.set_extra(&field, json!(value));
                                }
                            }
                            Err(e) => item_errors.push(format!("{}: detail extraction failed: {e}", entry.absolute_url)),
                        },
                        Err(e) => item_errors.push(format!("{}: detail fetch failed: {e}", entry.absolute_url)),
                    }
                }
            }

            items.push(item);
        }

        Ok(FetchOutcome { items, item_errors })
    }
}

pub fn request_options(source: &SourceDefinition) -> FetchOptions {
    FetchOptions {
        user_agent: None,
        encoding_override: source.encoding.clone(),
        verify_ssl: source.extras.verify_ssl,
        cookies: source.extras.cookies.clone(),
        min_request_delay: source
            .request_delay_seconds
            .map(std::time::Duration::from_secs_f64),
        timeout: None,
        extra_headers: source
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}
