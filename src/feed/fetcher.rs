use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Browser-like agent string; several providers reject unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Per-request deadline used when the configuration does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that abort one source fetch (or one sub-feed of a multi-feed source).
///
/// None of these escape the source that produced them: the aggregator turns
/// them into a per-source failure reason.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the per-request deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Payload could not be read as the source's wire format
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Every sub-feed of a multi-feed source failed
    #[error("All {attempted} sub-feeds failed; last error: {last}")]
    AllSubFeedsFailed { attempted: usize, last: String },
}

impl FetchError {
    /// Short class name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => "connection",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Parse(_) => "parse",
            FetchError::ResponseTooLarge | FetchError::IncompleteResponse { .. } => "transport",
            FetchError::AllSubFeedsFailed { .. } => "all_subfeeds",
        }
    }
}

/// Shared HTTP client for all source adapters.
///
/// Cloning is cheap (the underlying `reqwest::Client` is reference counted).
/// Every request made through [`FeedClient::get_bytes`] has its own deadline
/// covering connect, headers and body.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, timeout })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(config.timeout(), &config.user_agent)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches `url` and returns the full response body.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] - Deadline exceeded anywhere in the exchange
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
    /// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, timeout_ms = self.timeout.as_millis() as u64, "Fetching feed");

        let exchange = async {
            let response = self.http.get(url).send().await?;

            if !response.status().is_success() {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }

            read_limited_bytes(response, MAX_FEED_SIZE).await
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Err(FetchError::Network(e))) if e.is_timeout() => Err(FetchError::Timeout(self.timeout)),
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // EDGE-005: A network interruption mid-body leaves fewer bytes than announced
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
