//! Per-stage bookkeeping (spec §4.10): `{name, status, duration_seconds,
//! error}`, modeled after `riptide-workers::processors`' per-job result
//! structs — a plain data record the orchestrator accumulates one per
//! stage rather than propagating exceptions between stages.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub name: &'static str,
    pub status: StageStatus,
    pub duration_seconds: f64,
    pub error: Option<String>,
}

impl StageRecord {
    pub fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: StageStatus::Skipped,
            duration_seconds: 0.0,
            error: None,
        }
    }
}

/// Times a stage closure and folds its outcome into a `StageRecord`,
/// never propagating the error to the caller (spec §4.10 "the
/// orchestrator continues past failed stages by default").
pub async fn timed_stage<F, Fut, T>(name: &'static str, f: F) -> (StageRecord, Option<T>)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, String>>,
{
    let started = Instant::now();
    match f().await {
        Ok(value) => {
            let record = StageRecord {
                name,
                status: StageStatus::Success,
                duration_seconds: started.elapsed().as_secs_f64(),
                error: None,
            };
            (record, Some(value))
        }
        Err(message) => {
            let record = StageRecord {
                name,
                status: StageStatus::Failed,
                duration_seconds: started.elapsed().as_secs_f64(),
                error: Some(message),
            };
            (record, None)
        }
    }
}

/// Overall status derived from the accumulated stage records (spec
/// §4.10: "success iff all stages success or skipped; else partial or
/// failed").
pub fn overall_status(stages: &[StageRecord]) -> &'static str {
    let failed = stages.iter().filter(|s| s.status == StageStatus::Failed).count();
    let succeeded = stages.iter().filter(|s| s.status == StageStatus::Success).count();
    if failed == 0 {
        "success"
    } else if succeeded > 0 {
        "partial"
    } else {
        "failed"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatus {
    pub overall: &'static str,
    pub stages: Vec<StageRecord>,
    pub generated_at: DateTime<Utc>,
}

impl PipelineStatus {
    pub fn new(stages: Vec<StageRecord>) -> Self {
        Self {
            overall: overall_status(&stages),
            stages,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_is_success_when_all_succeed_or_skip() {
        let stages = vec![
            StageRecord {
                name: "a",
                status: StageStatus::Success,
                duration_seconds: 0.1,
                error: None,
            },
            StageRecord::skipped("b"),
        ];
        assert_eq!(overall_status(&stages), "success");
    }

    #[test]
    fn overall_is_partial_when_some_fail_and_some_succeed() {
        let stages = vec![
            StageRecord {
                name: "a",
                status: StageStatus::Success,
                duration_seconds: 0.1,
                error: None,
            },
            StageRecord {
                name: "b",
                status: StageStatus::Failed,
                duration_seconds: 0.1,
                error: Some("boom".into()),
            },
        ];
        assert_eq!(overall_status(&stages), "partial");
    }

    #[test]
    fn overall_is_failed_when_nothing_succeeds() {
        let stages = vec![StageRecord {
            name: "a",
            status: StageStatus::Failed,
            duration_seconds: 0.1,
            error: Some("boom".into()),
        }];
        assert_eq!(overall_status(&stages), "failed");
    }
}
