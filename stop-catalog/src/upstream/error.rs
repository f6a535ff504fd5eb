//! Upstream client error types.

/// Errors that can occur when querying the upstream transit-data service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication failed
    #[error("unauthorized: check DIGITRANSIT_API_KEY")]
    Unauthorized,

    /// Rate limited by the API
    #[error("rate limited by upstream API")]
    RateLimited,

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// The query was rejected by the GraphQL layer
    #[error("GraphQL error: {message}")]
    GraphQl { message: String },

    /// The upstream service has no stop with this ID
    #[error("no stop found upstream with ID '{stop_id}'")]
    StopNotFound { stop_id: String },
}
