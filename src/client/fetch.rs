//! HTTP client for a whiteboard server.
//!
//! # Examples
//!
//! ```no_run
//! use whiteboard_sync::client::{ClientConfig, WhiteboardClient};
//!
//! # async fn run() -> whiteboard_sync::Result<()> {
//! let client = WhiteboardClient::with_config(ClientConfig::for_endpoint("http://127.0.0.1:3000"));
//!
//! let board = client.fetch_document("board-1").await?;
//! let edited = board.document.replace("</root>", r#"<mxCell id="n1"/></root>"#);
//! let committed = client
//!     .update_document("board-1", Some(board.version), &edited)
//!     .await?;
//! println!("now at version {}", committed.committed_version);
//! # Ok(())
//! # }
//! ```

use crate::client::config::ClientConfig;
use crate::client::utils::exponential_backoff;
use crate::error::{Result, WhiteboardError};
use crate::protocol::{
    decode, encode, ErrorBody, GetWhiteboardRequest, GetWhiteboardResponse, SetWhiteboardRequest,
    SetWhiteboardResponse, API_VERSION, GET_PATH, SET_PATH,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// A fetched whiteboard with its content decoded to document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhiteboardSnapshot {
    /// Whiteboard identifier
    pub identifier: String,
    /// Version the document was read at
    pub version: u64,
    /// Document text (empty for a fresh whiteboard)
    pub document: String,
}

/// Client for the `/api/get` and `/api/set` routes.
///
/// Requests that fail with a retryable status are retried with exponential
/// backoff up to [`ClientConfig::max_retries`] times.
#[derive(Clone)]
pub struct WhiteboardClient {
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl WhiteboardClient {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_default();

        WhiteboardClient {
            client,
            config: Arc::new(config),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the newest version; the content is the raw payload token.
    pub async fn fetch(&self, identifier: &str) -> Result<GetWhiteboardResponse> {
        let request = GetWhiteboardRequest {
            api_version: Some(API_VERSION),
            identifier: identifier.to_string(),
        };
        self.post(GET_PATH, &request).await
    }

    /// Submit a payload token edited from `source_version`.
    ///
    /// Pass `None` when the edit's base version is unknown; the server then
    /// falls back to a positional merge against its newest version.
    ///
    /// # Errors
    ///
    /// [`WhiteboardError::SourceVersionNotFound`] when the server no longer has
    /// `source_version`; the caller must fetch again and redo its edit.
    pub async fn update(
        &self,
        identifier: &str,
        source_version: Option<u64>,
        content: impl Into<String>,
    ) -> Result<SetWhiteboardResponse> {
        let request = SetWhiteboardRequest {
            api_version: Some(API_VERSION),
            identifier: identifier.to_string(),
            source_version,
            content: content.into(),
        };

        match self.post(SET_PATH, &request).await {
            Err(WhiteboardError::Http(msg)) if msg.starts_with("409") => {
                Err(WhiteboardError::SourceVersionNotFound {
                    identifier: identifier.to_string(),
                    version: source_version.unwrap_or_default(),
                })
            }
            other => other,
        }
    }

    /// Fetch and decode the newest document.
    pub async fn fetch_document(&self, identifier: &str) -> Result<WhiteboardSnapshot> {
        let response = self.fetch(identifier).await?;
        Ok(WhiteboardSnapshot {
            document: decode(&response.content)?,
            identifier: response.identifier,
            version: response.version,
        })
    }

    /// Encode and submit document text edited from `source_version`.
    pub async fn update_document(
        &self,
        identifier: &str,
        source_version: Option<u64>,
        document: &str,
    ) -> Result<SetWhiteboardResponse> {
        self.update(identifier, source_version, encode(document)?).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.url(path)?;
        let mut attempt = 0;
        loop {
            match self.post_once(url.clone(), body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = exponential_backoff(attempt, self.config.retry_delay_ms);
                    warn!(
                        path,
                        attempt = attempt + 1,
                        ?delay,
                        error = %e,
                        "request failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once<B, T>(&self, url: url::Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "response received");

        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
        };
        Err(WhiteboardError::Http(format!("{} {}", status.as_u16(), message)))
    }
}

impl Default for WhiteboardClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> WhiteboardClient {
        WhiteboardClient::with_config(ClientConfig {
            endpoint: server.url(),
            retry_delay_ms: 1,
            ..Default::default()
        })
    }

    #[test]
    fn test_client_creation() {
        let client = WhiteboardClient::new();
        assert_eq!(client.config().max_retries, 3);
    }

    #[tokio::test]
    async fn test_fetch_document_decodes() {
        let mut server = mockito::Server::new_async().await;
        let document = r#"<mxGraphModel><root><mxCell id="0"/></root></mxGraphModel>"#;
        let body = serde_json::json!({
            "identifier": "doc",
            "content": encode(document).unwrap(),
            "version": 4,
        });
        let mock = server
            .mock("POST", GET_PATH)
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"identifier": "doc"}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;

        let snapshot = client_for(&server).fetch_document("doc").await.unwrap();
        assert_eq!(snapshot.version, 4);
        assert_eq!(snapshot.document, document);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_sends_source_version() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "identifier": "doc",
            "content": "abc",
            "requestSourceWhiteboardVersion": 2,
            "existingNewestWhiteboardVersion": 2,
            "currentNewestWhiteboardVersion": 3,
        });
        let mock = server
            .mock("POST", SET_PATH)
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "identifier": "doc",
                "sourceWhiteboardVersion": 2,
                "content": "abc",
            })))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let response = client_for(&server).update("doc", Some(2), "abc").await.unwrap();
        assert_eq!(response.committed_version, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_conflict_maps_to_source_version_not_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SET_PATH)
            .with_status(409)
            .with_body(r#"{"error":"gone","retryable":false}"#)
            .expect(1)
            .create_async()
            .await;

        let result = client_for(&server).update("doc", Some(1), "abc").await;
        assert!(matches!(
            result,
            Err(WhiteboardError::SourceVersionNotFound { version: 1, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_then_gives_up() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SET_PATH)
            .with_status(503)
            .with_body(r#"{"error":"contended","retryable":true}"#)
            .expect(4)
            .create_async()
            .await;

        let result = client_for(&server).update("doc", Some(1), "abc").await;
        match result {
            Err(WhiteboardError::Http(msg)) => assert_eq!(msg, "503 contended"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.committed_version)),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_request_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GET_PATH)
            .with_status(400)
            .with_body("not json")
            .expect(1)
            .create_async()
            .await;

        let result = client_for(&server).fetch("doc").await;
        assert!(matches!(result, Err(WhiteboardError::Http(msg)) if msg.starts_with("400")));
        mock.assert_async().await;
    }
}
