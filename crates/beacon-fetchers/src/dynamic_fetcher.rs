//! The `dynamic` strategy (spec §4.5): render via C2, run C4 list
//! extraction; details via the shared browser context unless
//! `detail_via_plain_http` is set, in which case C1 is used instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use beacon_browser::{HeadlessBrowserProvider, RenderRequest, WaitCondition};
use beacon_extract::{extract_detail, extract_list};
use beacon_http::HttpClient;
use beacon_types::error::MonitorResult;
use beacon_types::item::CrawledItem;
use beacon_types::source::{normalize_base_url, SourceDefinition};
use beacon_types::urlutil::url_hash;

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::static_fetcher::request_options;

pub struct DynamicFetcher {
    pub http: Arc<HttpClient>,
    pub browser: Arc<dyn HeadlessBrowserProvider>,
    pub render_timeout: Duration,
    pub detail_render_timeout: Duration,
}

impl DynamicFetcher {
    pub fn new(
        http: Arc<HttpClient>,
        browser: Arc<dyn HeadlessBrowserProvider>,
        render_timeout: Duration,
        detail_render_timeout: Duration,
    ) -> Self {
        Self {
            http,
            browser,
            render_timeout,
            detail_render_timeout,
        }
    }

    fn wait_condition(source: &SourceDefinition, timeout: Duration) -> WaitCondition {
        match source.wait_condition.as_deref() {
            Some(css) if !css.is_empty() => WaitCondition::Selector {
                css: css.to_string(),
                timeout,
            },
            _ => WaitCondition::NavigationOnly,
        }
    }
}

#[async_trait]
impl Fetcher for DynamicFetcher {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let base_url = source
            .normalized_base_url()
            .unwrap_or_else(|| normalize_base_url(&source.url));

        let mut context = self.browser.acquire().await?;
        let rendered = context
            .render(RenderRequest {
                url: source.url.clone(),
                wait: Self::wait_condition(source, self.render_timeout),
                timeout: self.render_timeout,
            })
            .await?;

        let keyword_filter = source.effective_keyword_filter().unwrap_or(&[]);
        let list_entries = extract_list(&rendered.html, &source.list_selectors, &base_url, keyword_filter)?;

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
                    let detail_html = if source.extras.detail_via_plain_http {
                        let options = request_options(source);
                        self.http
                            .fetch_page(&entry.absolute_url, &options)
                            .await
                            .map(|p| p.body)
                    } else {
                        context
                            .render(RenderRequest {
                                url: entry.absolute_url.clone(),
                                wait: Self::wait_condition(source, self.detail_render_timeout),
                                timeout: self.detail_render_timeout,
                            })
                            .await
                            .map(|r| r.html)
                    };

                    match detail_html {
                        Ok(html) => match extract_detail(&html, detail_selectors, &base_url) {
                            Ok(detail) => {
                                item.content = detail.content;
                                item.content_html = detail.content_html;
                                item.content_hash = detail.content_hash;
                                item.author = detail.author;
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
                        Err(e) => item_errors.push(format!("{}: detail render failed: {e}", entry.absolute_url)),
                    }
                }
            }

            items.push(item);
        }

        Ok(FetchOutcome { items, item_errors })
    }
}
