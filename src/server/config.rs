//! Server configuration.
//!
//! Loaded from an optional JSON file, then overridden by `WHITEBOARD_*`
//! environment variables. Every field has a default, so an empty object
//! (or no file at all) is a valid configuration.

use crate::error::{Result, WhiteboardError};
use crate::protocol::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::server::service::DEFAULT_MAX_UPDATE_ATTEMPTS;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tokio::fs;

/// Environment variable overriding [`ServerConfig::bind_address`].
pub const ENV_BIND_ADDRESS: &str = "WHITEBOARD_BIND_ADDRESS";
/// Environment variable overriding [`ServerConfig::max_update_attempts`].
pub const ENV_MAX_UPDATE_ATTEMPTS: &str = "WHITEBOARD_MAX_UPDATE_ATTEMPTS";
/// Environment variable overriding [`ServerConfig::record_cache_capacity`].
pub const ENV_CACHE_CAPACITY: &str = "WHITEBOARD_CACHE_CAPACITY";
/// Environment variable overriding [`ServerConfig::allowed_origin`].
pub const ENV_ALLOWED_ORIGIN: &str = "WHITEBOARD_ALLOWED_ORIGIN";
/// Environment variable overriding [`ServerConfig::max_document_bytes`].
pub const ENV_MAX_DOCUMENT_BYTES: &str = "WHITEBOARD_MAX_DOCUMENT_BYTES";

/// Configuration for the whiteboard HTTP server.
///
/// # Examples
///
/// ```
/// use whiteboard_sync::server::ServerConfig;
///
/// let config: ServerConfig = serde_json::from_str(r#"{"maxUpdateAttempts": 5}"#).unwrap();
/// assert_eq!(config.max_update_attempts, 5);
/// assert_eq!(config.bind_address, "127.0.0.1:3000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Read-merge-write cycles per update before giving up
    #[serde(default = "default_max_update_attempts")]
    pub max_update_attempts: u32,

    /// Number of exact-version records kept in the LRU cache (0 disables it)
    #[serde(default = "default_record_cache_capacity")]
    pub record_cache_capacity: usize,

    /// Origin allowed by CORS; any origin when unset
    #[serde(default)]
    pub allowed_origin: Option<String>,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Largest document a payload token may inflate to
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_update_attempts() -> u32 {
    DEFAULT_MAX_UPDATE_ATTEMPTS
}

fn default_record_cache_capacity() -> usize {
    256
}

fn default_max_body_bytes() -> usize {
    4 * 1024 * 1024
}

fn default_max_document_bytes() -> usize {
    DEFAULT_MAX_DOCUMENT_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_update_attempts: default_max_update_attempts(),
            record_cache_capacity: default_record_cache_capacity(),
            allowed_origin: None,
            max_body_bytes: default_max_body_bytes(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

impl ServerConfig {
    /// Load from `path` if given, then apply environment overrides and validate.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).await.map_err(|e| {
                    WhiteboardError::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    WhiteboardError::Config(format!("failed to parse {}: {}", path.display(), e))
                })?
            }
            None => ServerConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(ENV_BIND_ADDRESS) {
            self.bind_address = address;
        }
        if let Some(attempts) = lookup(ENV_MAX_UPDATE_ATTEMPTS) {
            self.max_update_attempts = parse_number(ENV_MAX_UPDATE_ATTEMPTS, &attempts)?;
        }
        if let Some(capacity) = lookup(ENV_CACHE_CAPACITY) {
            self.record_cache_capacity = parse_number(ENV_CACHE_CAPACITY, &capacity)?;
        }
        if let Some(origin) = lookup(ENV_ALLOWED_ORIGIN) {
            self.allowed_origin = if origin.is_empty() { None } else { Some(origin) };
        }
        if let Some(bytes) = lookup(ENV_MAX_DOCUMENT_BYTES) {
            self.max_document_bytes = parse_number(ENV_MAX_DOCUMENT_BYTES, &bytes)?;
        }
        Ok(())
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.max_update_attempts == 0 {
            return Err(WhiteboardError::Config(
                "maxUpdateAttempts must be at least 1".to_string(),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(WhiteboardError::Config(
                "maxBodyBytes must be at least 1".to_string(),
            ));
        }
        if self.max_document_bytes == 0 {
            return Err(WhiteboardError::Config(
                "maxDocumentBytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed [`bind_address`](Self::bind_address).
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address.parse().map_err(|e| {
            WhiteboardError::Config(format!("invalid bind address '{}': {}", self.bind_address, e))
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| WhiteboardError::Config(format!("{}='{}': {}", key, value, e)))
}
