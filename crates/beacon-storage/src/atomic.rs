//! Write-to-temp-then-rename helper (spec §4.8, §8 "round-trip &
//! idempotence"), grounded on
//! `riptide-persistence::state::SpilloverManager::spill_session`'s
//! `fs::write(tmp)` + `fs::rename(tmp, final)` pattern.

use std::path::Path;

use beacon_types::error::{MonitorError, MonitorResult};
use serde::Serialize;
use tokio::fs;

/// Serialize `value` as pretty JSON and atomically replace `path`. On
/// write failure the prior file is left untouched (spec §4.8 step 4),
/// since we never rename until the temp file write has fully succeeded.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> MonitorResult<()> {
    let parent = path.parent().ok_or_else(|| {
        MonitorError::storage(path.display().to_string(), "path has no parent directory")
    })?;
    fs::create_dir_all(parent)
        .await
        .map_err(|e| MonitorError::storage(parent.display().to_string(), e.to_string()))?;

    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| MonitorError::integrity(format!("failed to serialize {}: {e}", path.display())))?;

    let temp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact")
    ));

    fs::write(&temp_path, &body)
        .await
        .map_err(|e| MonitorError::storage(temp_path.display().to_string(), e.to_string()))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| MonitorError::storage(path.display().to_string(), e.to_string()))?;

    Ok(())
}

/// Read and parse a JSON file if it exists; `None` if the file is absent.
/// A malformed file is an `IntegrityError` rather than a silent `None`,
/// so callers can decide whether to fall back to "no prior artifact"
/// (spec §7: "treat as missing and re-crawl").
pub async fn read_json_opt<T: serde::de::DeserializeOwned>(path: &Path) -> MonitorResult<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| MonitorError::integrity(format!("corrupted artifact at {}: {e}", path.display())))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MonitorError::storage(path.display().to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn round_trips_through_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sample.json");
        write_json_atomic(&path, &Sample { value: 7 }).await.unwrap();
        let read: Option<Sample> = read_json_opt(&path).await.unwrap();
        assert_eq!(read, Some(Sample { value: 7 }));
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let read: Option<Sample> = read_json_opt(&path).await.unwrap();
        assert_eq!(read, None);
    }

    #[tokio::test]
    async fn corrupted_file_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let err = read_json_opt::<Sample>(&path).await.unwrap_err();
        assert!(matches!(err, MonitorError::Integrity { .. }));
    }

    #[tokio::test]
    async fn overwrite_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        write_json_atomic(&path, &Sample { value: 1 }).await.unwrap();
        write_json_atomic(&path, &Sample { value: 2 }).await.unwrap();
        let read: Option<Sample> = read_json_opt(&path).await.unwrap();
        assert_eq!(read, Some(Sample { value: 2 }));
    }
}
