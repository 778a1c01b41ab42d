//! Index generation (spec §4.10 stage 7): `data/index.json`, the single
//! file a future read API can load once per request cycle to answer the
//! dimension-overview and health endpoints (spec §6) without re-scanning
//! every raw artifact itself.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use beacon_storage::atomic::write_json_atomic;
use beacon_storage::paths::index_path;
use beacon_storage::reader::{dimension_overview, summarize_health, DimensionOverview, HealthSummary};
use beacon_storage::SourceStateStore;
use beacon_types::error::MonitorResult;

#[derive(Debug, Serialize)]
pub struct IndexDocument {
    pub generated_at: DateTime<Utc>,
    pub dimensions: Vec<DimensionOverview>,
    pub health: HealthSummary,
    pub source_count: usize,
}

pub async fn generate_index(data_root: &Path, states: &SourceStateStore, source_count: usize) -> MonitorResult<IndexDocument> {
    let dimensions = dimension_overview(data_root)?;
    let snapshot = states.snapshot().await;
    let health = summarize_health(snapshot.values());

    let doc = IndexDocument {
        generated_at: Utc::now(),
        dimensions,
        health,
        source_count,
    };

    write_json_atomic(&index_path(data_root), &doc).await?;
    Ok(doc)
}
