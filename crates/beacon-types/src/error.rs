//! Error taxonomy for the monitoring pipeline (spec §7).

use thiserror::Error;

/// Core error type shared by every crate in the workspace.
///
/// Mirrors the shape of a teacher-style `CoreError`: one variant per
/// failure class named in the specification, each carrying enough
/// context to decide whether the caller should retry.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    #[error("transient fetch error ({status:?}) for {url}: {message}")]
    TransientFetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("permanent fetch error ({status:?}) for {url}: {message}")]
    PermanentFetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("decode error for {url}: {message}")]
    Decode { url: String, message: String },

    #[error("selector miss: selector {selector:?} matched nothing on {url}")]
    SelectorMiss { url: String, selector: String },

    #[error("render error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("oracle error: {message}")]
    Oracle { message: String },

    #[error("storage error on {path}: {message}")]
    Storage { path: String, message: String },

    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl MonitorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    pub fn configuration_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn transient_fetch(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::TransientFetch {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    pub fn permanent_fetch(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::PermanentFetch {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn selector_miss(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::SelectorMiss {
            url: url.into(),
            selector: selector.into(),
        }
    }

    pub fn render(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle {
            message: message.into(),
        }
    }

    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// Whether a caller should retry the operation that produced this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            MonitorError::TransientFetch { .. } => true,
            MonitorError::Render { .. } => true,
            MonitorError::Oracle { .. } => true,
            MonitorError::Configuration { .. }
            | MonitorError::PermanentFetch { .. }
            | MonitorError::Decode { .. }
            | MonitorError::SelectorMiss { .. }
            | MonitorError::Storage { .. }
            | MonitorError::Integrity { .. } => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MonitorError::Configuration { .. } => "check the source YAML and environment variables",
            MonitorError::TransientFetch { .. } => "retry with backoff; check upstream availability",
            MonitorError::PermanentFetch { .. } => "fix the source URL or drop the source",
            MonitorError::Decode { .. } => "check encoding_override and the source's content-type",
            MonitorError::SelectorMiss { .. } => "selectors have drifted; update the source catalog",
            MonitorError::Render { .. } => "check the wait_condition and browser pool health",
            MonitorError::Oracle { .. } => "enrichment is best-effort; rule-engine fields still apply",
            MonitorError::Storage { .. } => "check disk space and permissions under data/",
            MonitorError::Integrity { .. } => "an artifact is corrupted; treat as missing and re-crawl",
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
