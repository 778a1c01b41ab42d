//! Shared domain types, configuration records, and error taxonomy for the
//! beacon information-monitoring pipeline.

pub mod artifact;
pub mod dimension;
pub mod error;
pub mod item;
pub mod result;
pub mod source;
pub mod state;
pub mod urlutil;

pub use artifact::{RawArtifact, SnapshotRecord, SnapshotStore};
pub use dimension::{Dimension, Schedule};
pub use error::{MonitorError, MonitorResult};
pub use item::CrawledItem;
pub use result::{CrawlResult, CrawlStatus};
pub use source::{
    normalize_base_url, DetailSelectors, FetchKind, FetchStrategy, ListSelectors,
    SourceDefinition, StrategyExtras,
};
pub use state::{push_bounded, ArticleAnnotation, RunLogEntry, SourceHealth, SourceState, RUN_LOG_CAP};
