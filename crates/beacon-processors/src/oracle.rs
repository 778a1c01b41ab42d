//! The "Text-analysis Oracle" abstraction (spec §1, §4.10 stage 6, §4.11
//! Tier 2): one provider-agnostic trait so the rule-engine processors
//! never depend on a concrete LLM vendor, in the shape of
//! `ai-client::traits::Agent` from the retrieval pack — a single
//! `query`-style method returning a free-form JSON payload the caller
//! interprets per task, rather than one method per vendor protocol.

use async_trait::async_trait;
use serde_json::Value;

use beacon_types::error::{MonitorError, MonitorResult};

/// What kind of enrichment is being requested, purely for logging —
/// the oracle itself is prompt-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleTask {
    PolicyEnrich,
    PersonnelEnrich,
    TechEnrich,
    DailyBriefing,
}

impl OracleTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleTask::PolicyEnrich => "policy_enrich",
            OracleTask::PersonnelEnrich => "personnel_enrich",
            OracleTask::TechEnrich => "tech_enrich",
            OracleTask::DailyBriefing => "daily_briefing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub task: OracleTask,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct OracleResponse {
    pub raw: Value,
}

impl OracleResponse {
    pub fn field_str(&self, key: &str) -> Option<String> {
        self.raw.get(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn field_i64(&self, key: &str) -> Option<i64> {
        self.raw.get(key).and_then(Value::as_i64)
    }
}

/// Spec §7 "oracle failures are always non-fatal": every call site treats
/// an `Err` here as "skip enrichment for this item," never as a reason to
/// fail the processor.
#[async_trait]
pub trait TextAnalysisOracle: Send + Sync {
    async fn query(&self, request: OracleRequest) -> MonitorResult<OracleResponse>;
}

/// The disabled oracle (`ENABLE_LLM_ENRICHMENT=false` or no API key,
/// spec §4.10 stage 6): every call fails, which callers already treat as
/// best-effort-skip.
pub struct NullOracle;

#[async_trait]
impl TextAnalysisOracle for NullOracle {
    async fn query(&self, _request: OracleRequest) -> MonitorResult<OracleResponse> {
        Err(MonitorError::oracle("oracle enrichment is disabled"))
    }
}

/// A deterministic test double: always returns the same fixed payload,
/// regardless of the request.
pub struct MockOracle {
    pub fixed_response: Value,
}

impl MockOracle {
    pub fn new(fixed_response: Value) -> Self {
        Self { fixed_response }
    }
}

#[async_trait]
impl TextAnalysisOracle for MockOracle {
    async fn query(&self, _request: OracleRequest) -> MonitorResult<OracleResponse> {
        Ok(OracleResponse {
            raw: self.fixed_response.clone(),
        })
    }
}
