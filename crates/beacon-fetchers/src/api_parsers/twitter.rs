//! Twitter/X search and KOL-timeline parser (spec §4.5). Generic JSON
//! mapping over a configurable search/timeline endpoint, authenticated
//! with `TWITTER_API_KEY` (spec §6) as a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use beacon_http::{FetchOptions, HttpClient};
use beacon_types::error::MonitorResult;
use beacon_types::item::CrawledItem;
use beacon_types::source::SourceDefinition;
use beacon_types::urlutil::{content_hash, url_hash};

use crate::fetcher::{FetchOutcome, Fetcher};

#[derive(Debug, Deserialize)]
struct TweetResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    #[serde(default)]
    author_id: Option<String>,
    created_at: Option<String>,
}

pub struct TwitterParser {
    pub http: Arc<HttpClient>,
    pub api_key: Option<String>,
}

impl TwitterParser {
    pub fn new(http: Arc<HttpClient>, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

#[async_trait]
impl Fetcher for TwitterParser {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let mut extra_headers = Vec::new();
        if let Some(api_key) = &self.api_key {
            extra_headers.push(("Authorization".to_string(), format!("Bearer {api_key}")));
        }

        let options = FetchOptions {
            cookies: None,
            user_agent: None,
            encoding_override: None,
            verify_ssl: source.extras.verify_ssl,
            min_request_delay: None,
            timeout: None,
            extra_headers,
        };

        let response: TweetResponse = self.http.fetch_json(&source.url, &options).await?;

        let items = response
            .data
            .into_iter()
            .map(|tweet| {
                let url = format!("https://twitter.com/i/web/status/{}", tweet.id);
                CrawledItem {
                    title: truncated_title(&tweet.text),
                    url: url.clone(),
                    url_hash: url_hash(&url),
                    published_at: tweet
                        .created_at
                        .as_deref()
                        .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
                        .map(|d| d.date_naive()),
                    author: tweet.author_id,
                    summary: None,
                    content: tweet.text.clone(),
                    content_html: None,
                    content_hash: content_hash(&tweet.text),
                    source_id: source.id.clone(),
                    dimension: source.dimension,
                    tags: source.tags.iter().cloned().collect(),
                    extra: serde_json::Map::new(),
                    is_new: false,
                }
            })
            .collect();

        Ok(FetchOutcome {
            items,
            item_errors: Vec::new(),
        })
    }
}

fn truncated_title(text: &str) -> String {
    const MAX_LEN: usize = 80;
    if text.chars().count() <= MAX_LEN {
        text.to_string()
    } else {
        format!("{}…", text.chars().take(MAX_LEN).collect::<String>())
    }
}
