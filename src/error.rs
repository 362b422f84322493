//! Error types for whiteboard storage and merging.
//!
//! The [`Result`] type alias is used by every fallible operation in the crate.
//!
//! # Error Categories
//!
//! | Category | Variants | Retryable |
//! |----------|----------|-----------|
//! | Bad input | `Parse`, `MalformedElement`, `Encoding`, `Json` | No |
//! | Conflict | `SourceVersionNotFound` | No, client must re-fetch |
//! | Contention | `ConcurrentUpdateExhausted` | Yes |
//! | Internal | `PatchApplication`, `Store`, `Config` | No |
//! | Network | `Io`, `Http` | Depends |
//!
//! # Examples
//!
//! ```
//! use whiteboard_sync::WhiteboardError;
//!
//! let err = WhiteboardError::ConcurrentUpdateExhausted {
//!     identifier: "board-1".into(),
//!     attempts: 3,
//! };
//! assert!(err.is_retryable());
//!
//! let err = WhiteboardError::Parse("unexpected end of input".into());
//! assert!(!err.is_retryable());
//! assert!(err.is_client_error());
//! ```

use std::io;
use thiserror::Error;

/// Result type for whiteboard operations.
pub type Result<T> = std::result::Result<T, WhiteboardError>;

/// Errors that can occur while parsing, merging, storing or transporting whiteboards.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WhiteboardError {
    /// The serialized document is not well-formed markup.
    #[error("Document parse error: {0}")]
    Parse(String),

    /// A cell is missing its stable `id` attribute.
    ///
    /// Never skipped silently: dropping the cell would corrupt later merges.
    #[error("Malformed element: {0}")]
    MalformedElement(String),

    /// The version the client based its edit on can no longer be read.
    ///
    /// The client must fetch the newest version and redo its edit.
    #[error("Source version {version} of whiteboard '{identifier}' not found")]
    SourceVersionNotFound {
        /// Whiteboard identifier
        identifier: String,
        /// Version the client claimed as its source
        version: u64,
    },

    /// Every conditional write attempt lost to a concurrent writer.
    #[error("Whiteboard '{identifier}' still contended after {attempts} update attempts")]
    ConcurrentUpdateExhausted {
        /// Whiteboard identifier
        identifier: String,
        /// Number of read-merge-write cycles attempted
        attempts: u32,
    },

    /// A computed edit script did not apply to its own source sequence.
    ///
    /// The differencer and the merge engine disagree; this is a bug, not bad input.
    #[error("Patch application failed: {0}")]
    PatchApplication(String),

    /// Payload token is not valid base64, zlib or UTF-8.
    #[error("Payload encoding error: {0}")]
    Encoding(String),

    /// The backing store misbehaved or broke its contract.
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed or returned an unexpected status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for WhiteboardError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => WhiteboardError::Http(format!("{} {}", status.as_u16(), err)),
            None => WhiteboardError::Http(err.to_string()),
        }
    }
}

impl WhiteboardError {
    /// Check if the whole operation may succeed when retried unchanged.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            WhiteboardError::ConcurrentUpdateExhausted { .. } | WhiteboardError::Io(_) => true,
            WhiteboardError::Http(msg) => msg
                .get(..3)
                .and_then(|code| code.parse::<u16>().ok())
                .is_some_and(crate::client::is_retryable_status),
            _ => false,
        }
    }

    /// Check if the error was caused by the caller's input.
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WhiteboardError::Parse(_)
                | WhiteboardError::MalformedElement(_)
                | WhiteboardError::Encoding(_)
                | WhiteboardError::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contention_is_retryable() {
        let err = WhiteboardError::ConcurrentUpdateExhausted {
            identifier: "doc".into(),
            attempts: 3,
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("3 update attempts"));
    }

    #[test]
    fn test_source_version_not_found_not_retryable() {
        let err = WhiteboardError::SourceVersionNotFound {
            identifier: "doc".into(),
            version: 7,
        };
        assert!(!err.is_retryable());
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("Source version 7"));
    }

    #[test]
    fn test_http_503_is_retryable() {
        let err = WhiteboardError::Http("503 Service Unavailable".into());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_http_404_not_retryable() {
        let err = WhiteboardError::Http("404 Not Found".into());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_patch_application_is_internal() {
        let err = WhiteboardError::PatchApplication("script mismatch".into());
        assert!(!err.is_retryable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_parse_is_client_error() {
        assert!(WhiteboardError::Parse("bad".into()).is_client_error());
        assert!(WhiteboardError::MalformedElement("no id".into()).is_client_error());
        assert!(WhiteboardError::Encoding("bad base64".into()).is_client_error());
    }
}
