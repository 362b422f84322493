//! HTTP client for whiteboard servers.
//!
//! Editors use this to load a whiteboard, remember the version they loaded,
//! and submit their edited document against that version. The server merges
//! the edit with anything committed in between.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch   - WhiteboardClient and HTTP operations
//! ├── config  - Client configuration
//! └── utils   - Retry helpers
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WhiteboardClient`] | Fetch and update over HTTP |
//! | [`WhiteboardSnapshot`] | Decoded document at a version |
//! | [`ClientConfig`] | Client configuration options |
//!
//! # Utility Functions
//!
//! ```
//! use whiteboard_sync::client::{exponential_backoff, is_retryable_status};
//! use std::time::Duration;
//!
//! assert!(is_retryable_status(503));
//! assert!(!is_retryable_status(409));
//!
//! let delay = exponential_backoff(2, 100);
//! assert_eq!(delay, Duration::from_millis(400));
//! ```

mod config;
mod fetch;
mod utils;

pub use config::ClientConfig;
pub use fetch::{WhiteboardClient, WhiteboardSnapshot};
pub use utils::*;
