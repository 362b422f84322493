//! Axum server for whiteboard fetch and update.
//!
//! The server is a thin JSON shell over [`WhiteboardService`], which holds
//! the versioned read-merge-write protocol. Any [`WhiteboardStore`] can back
//! it; [`app`] wraps the store in a [`CachedStore`] when a cache capacity is
//! configured.
//!
//! # Usage
//!
//! ```no_run
//! use whiteboard_sync::server::{app, ServerConfig};
//! use whiteboard_sync::store::InMemoryStore;
//!
//! # async fn run() -> whiteboard_sync::Result<()> {
//! let config = ServerConfig::default();
//! let router = app(InMemoryStore::new(), &config)?;
//!
//! let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod service;

pub use config::ServerConfig;
pub use middleware::HttpLayers;
pub use service::{Decision, WhiteboardService};

use crate::error::Result;
use crate::store::{CachedStore, WhiteboardStore};
use axum::Router;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::info;

/// Build the complete application router over `store`.
pub fn app<S>(store: S, config: &ServerConfig) -> Result<Router>
where
    S: WhiteboardStore + 'static,
{
    config.validate()?;

    let store: Arc<dyn WhiteboardStore> = match NonZeroUsize::new(config.record_cache_capacity) {
        Some(capacity) => {
            info!(capacity = capacity.get(), "record cache enabled");
            Arc::new(CachedStore::new(store, capacity))
        }
        None => Arc::new(store),
    };

    let service = Arc::new(
        WhiteboardService::with_max_attempts(store, config.max_update_attempts)
            .with_max_document_bytes(config.max_document_bytes),
    );
    HttpLayers::with_config(config.clone()).apply(routes::routes(service))
}
