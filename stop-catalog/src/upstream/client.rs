//! Digitransit GraphQL HTTP client.
//!
//! Queries the routing API for a stop's canonical name and coordinates.
//! Handles authentication, request prioritisation, and conversion to
//! domain types.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{StopAttributes, StopId};

use super::error::UpstreamError;
use super::source::{RequestPriority, StopSource};
use super::types::{GraphQlRequest, GraphQlResponse, STOP_QUERY, StopData, StopVariables};

/// Default endpoint for the HSL routing API.
const DEFAULT_BASE_URL: &str = "https://api.digitransit.fi/routing/v2/hsl/gtfs/v1";

/// Default maximum concurrent background requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Default number of permits reserved for high-priority requests.
const DEFAULT_MAX_CONCURRENT_HIGH: usize = 2;

/// Configuration for the Digitransit client.
#[derive(Debug, Clone)]
pub struct DigitransitConfig {
    /// Subscription key for authentication
    pub api_key: String,
    /// GraphQL endpoint URL
    pub base_url: String,
    /// Maximum concurrent normal-priority requests
    pub max_concurrent: usize,
    /// Maximum concurrent high-priority requests
    pub max_concurrent_high: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DigitransitConfig {
    /// Create a new config with the given subscription key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_concurrent_high: DEFAULT_MAX_CONCURRENT_HIGH,
            timeout_secs: 30,
        }
    }

    /// Set a custom endpoint URL (for testing or other regions).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent normal-priority requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set maximum concurrent high-priority requests.
    pub fn with_max_concurrent_high(mut self, n: usize) -> Self {
        self.max_concurrent_high = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Digitransit routing API client.
///
/// Normal and high-priority requests draw permits from separate semaphores,
/// so a latency-sensitive lookup never waits behind background traffic.
#[derive(Debug, Clone)]
pub struct DigitransitClient {
    http: reqwest::Client,
    base_url: String,
    background: Arc<Semaphore>,
    high_priority: Arc<Semaphore>,
}

impl DigitransitClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DigitransitConfig) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();

        let api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| UpstreamError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
        headers.insert("digitransit-subscription-key", api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            background: Arc::new(Semaphore::new(config.max_concurrent)),
            high_priority: Arc::new(Semaphore::new(config.max_concurrent_high)),
        })
    }

    fn semaphore(&self, priority: RequestPriority) -> &Semaphore {
        match priority {
            RequestPriority::High => &self.high_priority,
            RequestPriority::Normal => &self.background,
        }
    }

    /// Query one stop's name and coordinates.
    pub async fn get_stop(
        &self,
        stop_id: &StopId,
        priority: RequestPriority,
    ) -> Result<StopAttributes, UpstreamError> {
        let _permit =
            self.semaphore(priority)
                .acquire()
                .await
                .map_err(|_| UpstreamError::Api {
                    status: 0,
                    message: "Semaphore closed".to_string(),
                })?;

        debug!(stop_id = %stop_id, ?priority, "Querying upstream for stop");

        let request = GraphQlRequest {
            query: STOP_QUERY,
            variables: StopVariables {
                id: stop_id.as_str(),
            },
        };

        let response = self.http.post(&self.base_url).json(&request).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(UpstreamError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        decode_stop_response(stop_id, &body)
    }
}

impl StopSource for DigitransitClient {
    async fn fetch_stop(
        &self,
        stop_id: &StopId,
        priority: RequestPriority,
    ) -> Result<StopAttributes, UpstreamError> {
        self.get_stop(stop_id, priority).await
    }
}

/// Decode a GraphQL response body for [`STOP_QUERY`].
fn decode_stop_response(stop_id: &StopId, body: &str) -> Result<StopAttributes, UpstreamError> {
    let response: GraphQlResponse<StopData> =
        serde_json::from_str(body).map_err(|e| UpstreamError::Json {
            message: e.to_string(),
        })?;

    if !response.errors.is_empty() {
        let message = response
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(UpstreamError::GraphQl { message });
    }

    let data = response.data.ok_or_else(|| UpstreamError::Json {
        message: "response has neither data nor errors".to_string(),
    })?;

    data.stop
        .map(StopAttributes::from)
        .ok_or_else(|| UpstreamError::StopNotFound {
            stop_id: stop_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn stop_id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    #[test]
    fn config_builder() {
        let config = DigitransitConfig::new("test-key")
            .with_base_url("http://localhost:8080")
            .with_max_concurrent(10)
            .with_max_concurrent_high(3)
            .with_timeout(60);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.max_concurrent_high, 3);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = DigitransitConfig::new("test-key");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.max_concurrent_high, DEFAULT_MAX_CONCURRENT_HIGH);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn client_creation() {
        let client = DigitransitClient::new(DigitransitConfig::new("test-key"));
        assert!(client.is_ok());
    }

    #[test]
    fn invalid_api_key_rejected() {
        let client = DigitransitClient::new(DigitransitConfig::new("bad\nkey"));
        assert!(matches!(client, Err(UpstreamError::Api { status: 0, .. })));
    }

    #[test]
    fn decode_joins_graphql_errors() {
        let body = r#"{"errors":[{"message":"first"},{"message":"second"}]}"#;
        let err = decode_stop_response(&stop_id("1"), body).unwrap_err();
        assert_eq!(err.to_string(), "GraphQL error: first; second");
    }

    #[test]
    fn decode_rejects_empty_envelope() {
        let err = decode_stop_response(&stop_id("1"), "{}").unwrap_err();
        assert!(matches!(err, UpstreamError::Json { .. }));
    }

    #[test]
    fn decode_rejects_malformed_body() {
        let err = decode_stop_response(&stop_id("1"), "<html>").unwrap_err();
        assert!(matches!(err, UpstreamError::Json { .. }));
    }

    fn client_for(server: &Server) -> DigitransitClient {
        DigitransitClient::new(DigitransitConfig::new("test-key").with_base_url(server.url()))
            .unwrap()
    }

    #[tokio::test]
    async fn fetches_stop_attributes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("digitransit-subscription-key", "test-key")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"variables":{"id":"1234567"}}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"stop":{"name":"Main St","lat":60.17,"lon":24.94}}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let attributes = client
            .fetch_stop(&stop_id("1234567"), RequestPriority::High)
            .await
            .unwrap();

        assert_eq!(attributes.name, "Main St");
        assert_eq!(attributes.latitude, 60.17);
        assert_eq!(attributes.longitude, 24.94);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"stop":null}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_stop(&stop_id("nope"), RequestPriority::Normal)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::StopNotFound { ref stop_id } if stop_id == "nope"));
    }

    #[tokio::test]
    async fn unauthorized_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_stop(&stop_id("1"), RequestPriority::High)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Unauthorized));
    }

    #[tokio::test]
    async fn rate_limited_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(429)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_stop(&stop_id("1"), RequestPriority::Normal)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::RateLimited));
    }

    #[tokio::test]
    async fn server_error_keeps_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_stop(&stop_id("1"), RequestPriority::High)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error 503: upstream unavailable");
    }

    // Integration tests against the live API require a subscription key
    // and are not run here.
}
