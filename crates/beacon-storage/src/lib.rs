//! Storage layer (spec §4.8, C8): atomic raw-artifact persistence,
//! process-wide source state, bounded per-source run logs, the snapshot
//! store, and the read-side query helpers a future HTTP API would call.

pub mod artifact_store;
pub mod atomic;
pub mod log_store;
pub mod paths;
pub mod reader;
pub mod snapshot_store;
pub mod state_store;

pub use artifact_store::ArtifactStore;
pub use log_store::LogStore;
pub use reader::{dimension_overview, list_articles, summarize_health, ArticleFilter, DimensionOverview, HealthSummary};
pub use snapshot_store::FileSnapshotStore;
pub use state_store::SourceStateStore;
