//! Hacker News parser (spec §4.5): two-step API — top-story IDs, then
//! per-story detail, fetched with bounded concurrency.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;

use beacon_http::{FetchOptions, HttpClient};
use beacon_types::error::{MonitorError, MonitorResult};
use beacon_types::item::CrawledItem;
use beacon_types::source::SourceDefinition;
use beacon_types::urlutil::{content_hash, url_hash};

use crate::fetcher::{FetchOutcome, Fetcher};

const TOP_STORIES_URL: &str = "https://hacker-news.firebaseio.com/v0/topstories.json";
const DEFAULT_STORY_LIMIT: usize = 30;
const DETAIL_CONCURRENCY: usize = 8;

#[derive(Debug, Deserialize)]
struct HnItem {
    id: u64,
    title: Option<String>,
    url: Option<String>,
    text: Option<String>,
    by: Option<String>,
    time: Option<i64>,
}

pub struct HackerNewsParser {
    pub http: Arc<HttpClient>,
}

impl HackerNewsParser {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for HackerNewsParser {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let options = FetchOptions::default();
        let ids: Vec<u64> = self.http.fetch_json(TOP_STORIES_URL, &options).await?;
        let limit = source.extras.max_entries.unwrap_or(DEFAULT_STORY_LIMIT);

        let results: Vec<MonitorResult<HnItem>> = stream::iter(ids.into_iter().take(limit))
            .map(|id| {
                let http = Arc::clone(&self.http);
                async move {
                    let url = format!("https://hacker-news.firebaseio.com/v0/item/{id}.json");
                    http.fetch_json::<HnItem>(&url, &FetchOptions::default()).await
                }
            })
            .buffer_unordered(DETAIL_CONCURRENCY)
            .collect()
            .await;

        let mut items = Vec::new();
        let mut item_errors = Vec::new();

        for result in results {
            match result {
                Ok(story) => {
                    let Some(title) = story.title else { continue };
                    let url = story
                        .url
                        .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", story.id));
                    let content = story.text.clone().unwrap_or_default();
                    items.push(CrawledItem {
                        title,
                        url: url.clone(),
                        url_hash: url_hash(&url),
                        published_at: story
                            .time
                            .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
                            .map(|d| d.date_naive()),
                        author: story.by,
                        summary: None,
                        content: content.clone(),
                        content_html: None,
                        content_hash: content_hash(&content),
                        source_id: source.id.clone(),
                        dimension: source.dimension,
                        tags: source.tags.iter().cloned().collect(),
                        extra: serde_json::Map::new(),
                        is_new: false,
                    });
                }
                Err(e) => item_errors.push(format!("hacker news item fetch failed: {e}")),
            }
        }

        Ok(FetchOutcome { items, item_errors })
    }
}
