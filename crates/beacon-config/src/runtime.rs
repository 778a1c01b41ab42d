//! Environment variables that govern runtime behavior (spec §6).

use std::env;
use std::time::Duration;

/// Resource caps, oracle gating, and pipeline cron timing read from the
/// environment at process start.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub max_concurrent_crawls: usize,
    pub max_concurrent_per_domain: usize,
    pub playwright_max_contexts: usize,
    pub pipeline_cron_hour: u32,
    pub pipeline_cron_minute: u32,
    pub enable_llm_enrichment: bool,
    pub oracle_api_key: Option<String>,
    pub oracle_model: Option<String>,
    pub twitter_api_key: Option<String>,
    pub http_timeout: Duration,
    pub render_timeout: Duration,
    pub detail_render_timeout: Duration,
    pub shutdown_drain_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_crawls: 5,
            max_concurrent_per_domain: 2,
            playwright_max_contexts: 3,
            pipeline_cron_hour: 6,
            pipeline_cron_minute: 0,
            enable_llm_enrichment: false,
            oracle_api_key: None,
            oracle_model: None,
            twitter_api_key: None,
            http_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(15),
            detail_render_timeout: Duration::from_secs(10),
            shutdown_drain_timeout: Duration::from_secs(30),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_crawls: env_usize("MAX_CONCURRENT_CRAWLS", defaults.max_concurrent_crawls),
            max_concurrent_per_domain: env_usize(
                "MAX_CONCURRENT_PER_DOMAIN",
                defaults.max_concurrent_per_domain,
            ),
            playwright_max_contexts: env_usize(
                "PLAYWRIGHT_MAX_CONTEXTS",
                defaults.playwright_max_contexts,
            ),
            pipeline_cron_hour: env_u32("PIPELINE_CRON_HOUR", defaults.pipeline_cron_hour),
            pipeline_cron_minute: env_u32("PIPELINE_CRON_MINUTE", defaults.pipeline_cron_minute),
            enable_llm_enrichment: env_bool("ENABLE_LLM_ENRICHMENT", false),
            oracle_api_key: env::var("ORACLE_API_KEY").ok(),
            oracle_model: env::var("ORACLE_MODEL").ok(),
            twitter_api_key: env::var("TWITTER_API_KEY").ok(),
            ..defaults
        }
    }

    /// Oracle enrichment only runs when both the flag is set and a key is
    /// configured (spec §4.10 stage 6).
    pub fn oracle_enabled(&self) -> bool {
        self.enable_llm_enrichment && self.oracle_api_key.is_some()
    }
}

fn env_usize(var: &str, default: usize) -> usize {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(var: &str, default: u32) -> u32 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(var: &str, default: bool) -> bool {
    match env::var(var) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}
