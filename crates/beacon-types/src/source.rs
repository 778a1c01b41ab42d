use crate::dimension::{Dimension, Schedule};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The five built-in fetcher strategies (spec §4.5). Bespoke API parsers
/// are named separately via `SourceDefinition::parser_kind`, which takes
/// precedence over this field when present (spec §3 invariants, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    Static,
    Dynamic,
    Rss,
    Snapshot,
    Faculty,
}

/// The fetcher kind actually selected for a source, after resolving the
/// `parser_kind` vs `fetch_strategy` precedence rule (spec §3, §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    Static,
    Dynamic,
    Rss,
    Snapshot,
    Faculty,
    ApiParser(String),
}

/// List-page selector bundle (spec §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSelectors {
    pub list_item: String,
    /// `"_self"` means "use the list-item element's own text".
    pub title: String,
    pub link: String,
    #[serde(default = "default_link_attr")]
    pub link_attr: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub date_regex: Option<String>,
}

fn default_link_attr() -> String {
    "href".to_string()
}

/// Detail-page selector bundle (spec §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailSelectors {
    pub content: Option<String>,
    pub author: Option<String>,
    pub images: Option<String>,
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub heading_sections: HashMap<String, String>,
    #[serde(default)]
    pub label_prefix_sections: HashMap<String, String>,
}

/// Strategy-specific extras that don't belong to every source (spec §4.5,
/// §9 Open Questions).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyExtras {
    /// `rss`: cap on entries read from the feed (default 50).
    pub max_entries: Option<usize>,
    /// `faculty`: cap on roster pages to paginate through.
    pub max_pages: Option<u32>,
    /// `snapshot`: selector for the sub-DOM to hash.
    pub content_area: Option<String>,
    /// `snapshot`: regexes stripped from the content before hashing.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// `dynamic`: fetch detail pages via the plain HTTP client instead of
    /// reusing the browser context.
    #[serde(default)]
    pub detail_via_plain_http: bool,
    /// TLS-laxity switch (spec §4.1, §9 Open Questions): when `false`,
    /// certificate chain validation is disabled and legacy cipher suites
    /// are accepted.
    #[serde(default)]
    pub verify_ssl: Option<bool>,
    /// Optional raw `Cookie` header value for sources behind a login wall
    /// that the operator has already authenticated out of band.
    pub cookies: Option<String>,
}

/// Immutable configuration record for one declared source (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    pub id: String,
    pub name: String,
    pub dimension: Dimension,
    #[serde(default)]
    pub group: Option<String>,
    pub url: String,
    #[serde(default)]
    pub fetch_strategy: Option<FetchStrategy>,
    #[serde(default)]
    pub parser_kind: Option<String>,
    pub schedule: Schedule,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub list_selectors: ListSelectors,
    #[serde(default)]
    pub detail_selectors: Option<DetailSelectors>,
    #[serde(default)]
    pub wait_condition: Option<String>,
    #[serde(default)]
    pub keyword_filter: Option<Vec<String>>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub request_delay_seconds: Option<f64>,
    #[serde(default)]
    pub extras: StrategyExtras,
}

fn default_true() -> bool {
    true
}

impl SourceDefinition {
    /// Resolve the precedence rule from spec §3/§4.6: `parser_kind` wins
    /// over `fetch_strategy` when both are present.
    pub fn resolve_fetch_kind(&self) -> Result<FetchKind, String> {
        if let Some(name) = &self.parser_kind {
            return Ok(FetchKind::ApiParser(name.clone()));
        }
        match self.fetch_strategy {
            Some(FetchStrategy::Static) => Ok(FetchKind::Static),
            Some(FetchStrategy::Dynamic) => Ok(FetchKind::Dynamic),
            Some(FetchStrategy::Rss) => Ok(FetchKind::Rss),
            Some(FetchStrategy::Snapshot) => Ok(FetchKind::Snapshot),
            Some(FetchStrategy::Faculty) => Ok(FetchKind::Faculty),
            None => Err(format!(
                "source {}: neither parser_kind nor fetch_strategy is set",
                self.id
            )),
        }
    }

    /// Normalized base URL used for relative-link resolution (spec §4.3):
    /// non-empty and always ends with a trailing `/`.
    pub fn normalized_base_url(&self) -> Option<String> {
        self.base_url.as_deref().map(normalize_base_url)
    }

    /// Effective keyword filter: the source's own (possibly empty) list
    /// if present, otherwise `None` to signal "inherit dimension default".
    pub fn effective_keyword_filter(&self) -> Option<&[String]> {
        self.keyword_filter.as_deref()
    }
}

/// Append a trailing `/` to a non-empty base URL if missing (spec §4.3).
pub fn normalize_base_url(base: &str) -> String {
    if base.is_empty() {
        return base.to_string();
    }
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(id: &str) -> SourceDefinition {
        SourceDefinition {
            id: id.to_string(),
            name: "test".into(),
            dimension: Dimension::Technology,
            group: None,
            url: "https://example.com".into(),
            fetch_strategy: Some(FetchStrategy::Static),
            parser_kind: None,
            schedule: Schedule::Daily,
            enabled: true,
            priority: 0,
            list_selectors: ListSelectors::default(),
            detail_selectors: None,
            wait_condition: None,
            keyword_filter: None,
            base_url: None,
            tags: vec![],
            headers: HashMap::new(),
            encoding: None,
            request_delay_seconds: None,
            extras: StrategyExtras::default(),
        }
    }

    #[test]
    fn parser_kind_wins_over_fetch_strategy() {
        let mut s = minimal("ex1");
        s.parser_kind = Some("arxiv".to_string());
        assert_eq!(
            s.resolve_fetch_kind().unwrap(),
            FetchKind::ApiParser("arxiv".to_string())
        );
    }

    #[test]
    fn fetch_strategy_used_when_no_parser_kind() {
        let s = minimal("ex2");
        assert_eq!(s.resolve_fetch_kind().unwrap(), FetchKind::Static);
    }

    #[test]
    fn neither_set_is_an_error() {
        let mut s = minimal("ex3");
        s.fetch_strategy = None;
        assert!(s.resolve_fetch_kind().is_err());
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        assert_eq!(normalize_base_url("https://x/a/b"), "https://x/a/b/");
        assert_eq!(normalize_base_url("https://x/a/b/"), "https://x/a/b/");
        assert_eq!(normalize_base_url(""), "");
    }
}
