//! Whiteboard server backed by the in-memory store.
//!
//! Configuration is read from the JSON file named by `WHITEBOARD_CONFIG`
//! (optional) and `WHITEBOARD_*` overrides. Log filtering follows `RUST_LOG`.

use anyhow::Context;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use whiteboard_sync::server::{app, ServerConfig};
use whiteboard_sync::store::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("whiteboard_sync=info,tower_http=info")),
        )
        .init();

    let config_path = std::env::var_os("WHITEBOARD_CONFIG").map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref())
        .await
        .context("failed to load server configuration")?;

    let router = app(InMemoryStore::new(), &config).context("failed to build router")?;
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, "whiteboard server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
