//! Configuration for the whiteboard HTTP client.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `endpoint` | `http://127.0.0.1:3000` | Base URL of the server |
//! | `request_timeout_ms` | 10000 | Per-request timeout |
//! | `max_retries` | 3 | Retries after a retryable failure |
//! | `retry_delay_ms` | 250 | Base delay, doubled per retry |
//!
//! # Examples
//!
//! ```
//! use whiteboard_sync::client::ClientConfig;
//!
//! let config = ClientConfig {
//!     endpoint: "https://boards.example".to_string(),
//!     max_retries: 5,
//!     ..Default::default()
//! };
//! assert_eq!(config.retry_delay_ms, 250);
//! assert_eq!(config.url("/api/get").unwrap().as_str(), "https://boards.example/api/get");
//! ```

use crate::error::{Result, WhiteboardError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for [`WhiteboardClient`](super::WhiteboardClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Base URL the API paths are resolved against.
    pub endpoint: String,

    /// Timeout for a single HTTP request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum retries for failed requests.
    ///
    /// Only failures that may succeed unchanged are retried: timeouts,
    /// rate limiting, gateway errors and server-side contention.
    pub max_retries: u32,

    /// Base retry delay in milliseconds.
    ///
    /// Retry `n` waits `retry_delay_ms * 2^n`.
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000".to_string(),
            request_timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 250,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `endpoint` with default retry policy.
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Resolve an API path against the endpoint.
    pub fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&self.endpoint)
            .and_then(|base| base.join(path))
            .map_err(|e| WhiteboardError::Config(format!("invalid endpoint '{}': {}", self.endpoint, e)))
    }
}
