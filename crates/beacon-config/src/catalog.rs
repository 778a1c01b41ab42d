//! Source catalog loading (spec §4.6, §6): YAML files under `sources/`,
//! one per dimension, plus a `twitter.yaml` that mixes dimensions via a
//! per-item `dimension` field.

use beacon_types::{Dimension, SourceDefinition};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("source {id} is missing a dimension and its file declares none")]
    MissingDimension { id: String },
    #[error("duplicate source id: {id}")]
    DuplicateId { id: String },
}

/// One entry in a catalog file. Identical to `SourceDefinition` except the
/// dimension is optional — it is inherited from the file's top-level
/// `dimension` key unless overridden (the `twitter.yaml` case, spec §6).
#[derive(Debug, Deserialize)]
struct SourceEntry {
    id: String,
    name: String,
    dimension: Option<Dimension>,
    #[serde(default)]
    group: Option<String>,
    url: String,
    #[serde(default)]
    fetch_strategy: Option<beacon_types::FetchStrategy>,
    #[serde(default)]
    parser_kind: Option<String>,
    schedule: beacon_types::Schedule,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    list_selectors: beacon_types::ListSelectors,
    #[serde(default)]
    detail_selectors: Option<beacon_types::DetailSelectors>,
    #[serde(default)]
    wait_condition: Option<String>,
    #[serde(default)]
    keyword_filter: Option<Vec<String>>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    request_delay_seconds: Option<f64>,
    #[serde(default)]
    extras: beacon_types::StrategyExtras,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    dimension: Option<Dimension>,
    sources: Vec<SourceEntry>,
}

/// Parse one catalog file's raw YAML text into resolved `SourceDefinition`s.
pub fn parse_catalog_str(path_label: &str, text: &str) -> Result<Vec<SourceDefinition>, CatalogError> {
    let file: CatalogFile = serde_yaml::from_str(text).map_err(|source| CatalogError::Parse {
        path: path_label.to_string(),
        source,
    })?;

    file.sources
        .into_iter()
        .map(|entry| {
            let dimension = entry
                .dimension
                .or(file.dimension)
                .ok_or_else(|| CatalogError::MissingDimension {
                    id: entry.id.clone(),
                })?;
            Ok(SourceDefinition {
                id: entry.id,
                name: entry.name,
                dimension,
                group: entry.group,
                url: entry.url,
                fetch_strategy: entry.fetch_strategy,
                parser_kind: entry.parser_kind,
                schedule: entry.schedule,
                enabled: entry.enabled,
                priority: entry.priority,
                list_selectors: entry.list_selectors,
                detail_selectors: entry.detail_selectors,
                wait_condition: entry.wait_condition,
                keyword_filter: entry.keyword_filter,
                base_url: entry.base_url,
                tags: entry.tags,
                headers: entry.headers,
                encoding: entry.encoding,
                request_delay_seconds: entry.request_delay_seconds,
                extras: entry.extras,
            })
        })
        .collect()
}

/// Load every `*.yaml`/`*.yml` file directly under `dir`, concatenate, and
/// validate the cross-file invariants from spec §3: globally unique ids.
pub fn load_catalog_dir(dir: &Path) -> Result<Vec<SourceDefinition>, CatalogError> {
    let mut all = Vec::new();
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| CatalogError::Read {
            path: dir.display().to_string(),
            source,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    entries.sort();

    for path in entries {
        let text = std::fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut sources = parse_catalog_str(&path.display().to_string(), &text)?;
        all.append(&mut sources);
    }

    validate_unique_ids(&all)?;
    Ok(all)
}

fn validate_unique_ids(sources: &[SourceDefinition]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for s in sources {
        if !seen.insert(s.id.clone()) {
            return Err(CatalogError::DuplicateId { id: s.id.clone() });
        }
    }
    Ok(())
}
