//! The `Fetcher` trait shared by every strategy and API parser (spec §4.5,
//! §9's "tagged union, not inheritance" design note: strategies share C4 as
//! a helper, never a base class).

use async_trait::async_trait;

use beacon_types::error::MonitorResult;
use beacon_types::item::CrawledItem;
use beacon_types::source::SourceDefinition;

/// A fetch that partially succeeded: kept items plus per-item error
/// messages (spec §4.5 "Common error handling" — never abort the whole
/// source on one bad item).
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub items: Vec<CrawledItem>,
    pub item_errors: Vec<String>,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_and_parse(&self, source: &SourceDefinition) -> MonitorResult<FetchOutcome>;
}
