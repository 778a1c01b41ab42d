//! The HTTP client itself (component C1): UA rotation, per-domain pacing,
//! circuit breaking, retry with backoff, and charset decoding.
//!
//! Grounded on `riptide-fetch::fetch::ReliableHttpClient`'s
//! `get_with_retry`/`post_with_retry` shape, adapted to run every call
//! through a per-host `DomainGate` as well as the circuit breaker.

use std::time::Duration;

use reqwest::Client;
use tracing::instrument;

use beacon_types::error::{MonitorError, MonitorResult};

use crate::circuit::{CircuitBreakerConfig, CircuitBreakerRegistry};
use crate::domain_gate::DomainGate;
use crate::encoding::decode_body;
use crate::retry::RetryConfig;
use crate::user_agent::random_user_agent;

/// Per-request overrides; `None` fields fall back to client-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub user_agent: Option<String>,
    pub encoding_override: Option<String>,
    pub verify_ssl: Option<bool>,
    pub cookies: Option<String>,
    pub min_request_delay: Option<Duration>,
    pub timeout: Option<Duration>,
    /// Extra request headers, e.g. `Authorization` for bespoke API parsers.
    pub extra_headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct FetchMetadata {
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: usize,
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub metadata: FetchMetadata,
}

/// Shared HTTP client: two underlying `reqwest::Client`s (strict and
/// TLS-lenient), one `DomainGate`, one `CircuitBreakerRegistry`.
pub struct HttpClient {
    strict: Client,
    lenient: Client,
    domain_gate: DomainGate,
    breakers: CircuitBreakerRegistry,
    retry: RetryConfig,
    default_timeout: Duration,
}

impl HttpClient {
    pub fn new(default_timeout: Duration, default_min_request_delay: Duration) -> MonitorResult<Self> {
        let build = |accept_invalid: bool, timeout: Duration| -> MonitorResult<Client> {
            Client::builder()
                .timeout(timeout)
                .danger_accept_invalid_certs(accept_invalid)
                .build()
                .map_err(|e| MonitorError::configuration(format!("failed to build http client: {e}")))
        };

        Ok(Self {
            strict: build(false, default_timeout)?,
            lenient: build(true, default_timeout)?,
            domain_gate: DomainGate::new(2, default_min_request_delay),
            breakers: CircuitBreakerRegistry::new(CircuitBreakerConfig::default()),
            retry: RetryConfig::default(),
            default_timeout,
        })
    }

    pub fn with_domain_concurrency(mut self, capacity: usize, default_delay: Duration) -> Self {
        self.domain_gate = DomainGate::new(capacity, default_delay);
        self
    }

    #[instrument(skip(self, options), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str, options: &FetchOptions) -> MonitorResult<FetchedPage> {
        let parsed = url::Url::parse(url).map_err(|e| MonitorError::permanent_fetch(url, None, e.to_string()))?;
        let host = parsed.host_str().unwrap_or("").to_string();

        let _permit = self.domain_gate.acquire(&host, options.min_request_delay).await;

        let client = if options.verify_ssl == Some(false) {
            &self.lenient
        } else {
            &self.strict
        };

        let ua = options
            .user_agent
            .clone()
            .unwrap_or_else(|| random_user_agent().to_string());

        let mut last_err: Option<MonitorError> = None;
        for attempt in 0..self.retry.max_attempts {
            let url = url.to_string();
            let ua = ua.clone();
            let cookies = options.cookies.clone();
            let extra_headers = options.extra_headers.clone();
            let timeout = options.timeout.unwrap_or(self.default_timeout);
            let result = self
                .breakers
                .guarded_call(&host, || async {
                    send_once(client, &url, &ua, cookies.as_deref(), &extra_headers, timeout).await
                })
                .await;

            match result {
                Ok((bytes, status, content_type, final_url)) => {
                    if !(200..300).contains(&status) {
                        let retryable = RetryConfig::should_retry_status(status);
                        let err = if retryable {
                            MonitorError::transient_fetch(&final_url, Some(status), "non-2xx response")
                        } else {
                            return Err(MonitorError::permanent_fetch(&final_url, Some(status), "non-2xx response"));
                        };
                        last_err = Some(err);
                    } else {
                        let body = decode_body(&bytes, content_type.as_deref(), options.encoding_override.as_deref());
                        return Ok(FetchedPage {
                            metadata: FetchMetadata {
                                final_url,
                                status,
                                content_type,
                                content_length: bytes.len(),
                            },
                            body,
                        });
                    }
                }
                Err(err) => {
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
            }

            if attempt + 1 < self.retry.max_attempts {
                tokio::time::sleep(self.retry.delay_for(attempt)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| MonitorError::transient_fetch(url, None, "exhausted retries")))
    }

    pub async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> MonitorResult<T> {
        let page = self.fetch_page(url, options).await?;
        serde_json::from_str(&page.body).map_err(|e| MonitorError::decode(url, e.to_string()))
    }
}

async fn send_once(
    client: &Client,
    url: &str,
    user_agent: &str,
    cookies: Option<&str>,
    extra_headers: &[(String, String)],
    timeout: Duration,
) -> MonitorResult<(Vec<u8>, u16, Option<String>, String)> {
    let mut builder = client.get(url).header("User-Agent", user_agent).timeout(timeout);
    if let Some(cookie_header) = cookies {
        builder = builder.header("Cookie", cookie_header);
    }
    for (name, value) in extra_headers {
        builder = builder.header(name, value);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| MonitorError::transient_fetch(url, None, e.to_string()))?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MonitorError::transient_fetch(&final_url, Some(status), e.to_string()))?;

    Ok((bytes.to_vec(), status, content_type, final_url))
}

pub use crate::circuit::CircuitBreakerConfig as BreakerConfig;
pub use crate::retry::RetryConfig as ClientRetryConfig;
