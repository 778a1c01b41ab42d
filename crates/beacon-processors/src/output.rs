//! `save_output_json` (spec §4.11): every processor output carries a
//! `generated_at` timestamp and is written atomically, exactly as
//! `beacon_storage::atomic::write_json_atomic` already does for raw
//! artifacts and state files.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use beacon_storage::atomic::write_json_atomic;
use beacon_types::error::MonitorResult;

#[derive(Debug, Serialize)]
pub struct OutputEnvelope<T: Serialize> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: T,
}

/// Writes `payload` to `path` wrapped with a fresh `generated_at`. A
/// `dry_run` skips the write entirely (spec §4.11 "dry_run writes
/// nothing").
pub async fn save_output_json<T: Serialize>(path: &Path, payload: T, dry_run: bool) -> MonitorResult<()> {
    if dry_run {
        return Ok(());
    }
    let envelope = OutputEnvelope {
        generated_at: Utc::now(),
        payload,
    };
    write_json_atomic(path, &envelope).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn dry_run_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        save_output_json(&path, json!({"a": 1}), true).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn writes_envelope_with_generated_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        save_output_json(&path, json!({"a": 1}), false).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("generated_at"));
        assert!(text.contains("\"a\""));
    }
}
