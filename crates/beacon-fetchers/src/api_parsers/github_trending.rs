//! GitHub trending parser (spec §4.5): REST + HTML, since the trending
//! page has no public JSON endpoint. Parses the public `github.com/trending`
//! markup directly with `scraper`.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};

use beacon_http::HttpClient;
use beacon_types::error::MonitorResult;
use beacon_types::item::CrawledItem;
use beacon_types::source::SourceDefinition;
use beacon_types::urlutil::url_hash;

use crate::fetcher::{FetchOutcome, Fetcher};
use crate::static_fetcher::request_options;

pub struct GithubTrendingParser {
    pub http: Arc<HttpClient>,
}

impl GithubTrendingParser {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Fetcher for GithubTrendingParser {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome> {
        let options = request_options(source);
        let page = self.http.fetch_page(&source.url, &options).await?;

        let document = Html::parse_document(&page.body);
        let row_selector = Selector::parse("article.Box-row").unwrap();
        let name_selector = Selector::parse("h2 a").unwrap();
        let desc_selector = Selector::parse("p").unwrap();
        let stars_selector = Selector::parse("a.Link--muted").unwrap();

        let mut items = Vec::new();
        for row in document.select(&row_selector) {
            let Some(name_el) = row.select(&name_selector).next() else {
                continue;
            };
            let repo_path = name_el
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("");
            if repo_path.is_empty() {
                continue;
            }
            let url = format!("https://github.com/{repo_path}");
            let description = row
                .select(&desc_selector)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let stars = row
                .select(&stars_selector)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string());

            let mut extra = serde_json::Map::new();
            if let Some(stars) = stars {
                extra.insert("stars_today".to_string(), serde_json::json!(stars));
            }

            items.push(CrawledItem {
                title: repo_path,
                url: url.clone(),
                url_hash: url_hash(&url),
                published_at: None,
                author: None,
                summary: Some(description.clone()),
                content: description,
                content_html: None,
                content_hash: None,
                source_id: source.id.clone(),
                dimension: source.dimension,
                tags: source.tags.iter().cloned().collect(),
                extra,
                is_new: false,
            });
        }

        Ok(FetchOutcome {
            items,
            item_errors: Vec::new(),
        })
    }
}
