//! HTTP client layer (spec §4.1, C1): User-Agent rotation, per-domain
//! concurrency and pacing, per-host circuit breaking, retry with backoff,
//! and charset decoding.

pub mod circuit;
pub mod domain_gate;
pub mod encoding;
pub mod fetch;
pub mod retry;
pub mod user_agent;

pub use circuit::{CircuitBreakerConfig, CircuitBreakerRegistry};
pub use domain_gate::{DomainGate, DomainPermit};
pub use fetch::{FetchMetadata, FetchOptions, FetchedPage, HttpClient};
pub use retry::RetryConfig;
pub use user_agent::random_user_agent;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_decodes_a_successful_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), Duration::from_millis(0)).unwrap();
        let page = client
            .fetch_page(&format!("{}/article", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(page.metadata.status, 200);
        assert!(page.body.contains("ok"));
    }

    #[tokio::test]
    async fn retries_on_503_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), Duration::from_millis(0)).unwrap();
        let page = client
            .fetch_page(&format!("{}/flaky", server.uri()), &FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(page.body, "recovered");
    }

    #[tokio::test]
    async fn does_not_retry_a_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5), Duration::from_millis(0)).unwrap();
        let result = client
            .fetch_page(&format!("{}/missing", server.uri()), &FetchOptions::default())
            .await;

        assert!(result.is_err());
    }
}
