//! Fetch-strategy tagged union plus the bespoke API-parser registry
//! (spec §4.5, §4.6, components C5/C6).

pub mod api_parsers;
pub mod dynamic_fetcher;
pub mod faculty_fetcher;
pub mod fetcher;
pub mod registry;
pub mod rss_fetcher;
pub mod snapshot_fetcher;
pub mod static_fetcher;

pub use dynamic_fetcher::DynamicFetcher;
pub use faculty_fetcher::FacultyFetcher;
pub use fetcher::{FetchOutcome, Fetcher};
pub use registry::FetcherRegistry;
pub use rss_fetcher::RssFetcher;
pub use snapshot_fetcher::SnapshotFetcher;
pub use static_fetcher::StaticFetcher;
