#![warn(missing_docs)]

//! # Whiteboard Sync: versioned storage and merging for MxGraph whiteboards
//!
//! Browser diagram editors save whole documents. When two people edit the
//! same whiteboard, the second save must not silently discard the first.
//! This crate stores every whiteboard as a chain of immutable versions and
//! reconciles stale saves with a three-way, cell-level merge.
//!
//! ## Overview
//!
//! 1. **Documents** - MxGraph XML read as an ordered list of `mxCell` elements
//! 2. **Merging** - Myers diff over cells, combining disjoint edits
//! 3. **Payloads** - documents travel as zlib-compressed base64 tokens
//! 4. **Versioned store** - optimistic read-merge-write with a bounded retry
//!
//! ## Server Usage
//!
//! ```no_run
//! use whiteboard_sync::server::{app, ServerConfig};
//! use whiteboard_sync::store::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> whiteboard_sync::Result<()> {
//!     let config = ServerConfig::default();
//!     let router = app(InMemoryStore::new(), &config)?;
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Merging Directly
//!
//! ```
//! use whiteboard_sync::merge::{DocumentMerger, MergeResolution};
//!
//! let ancestor = r#"<mxGraphModel><root><mxCell id="A"/><mxCell id="B"/></root></mxGraphModel>"#;
//! let old = r#"<mxGraphModel><root><mxCell id="A"/><mxCell id="B"/><mxCell id="C"/></root></mxGraphModel>"#;
//! let new = r#"<mxGraphModel><root><mxCell id="A"/><mxCell id="D"/><mxCell id="B"/></root></mxGraphModel>"#;
//!
//! let merged = DocumentMerger::new().merge(ancestor, old, new).unwrap();
//! assert_eq!(merged.resolution, MergeResolution::Combined);
//! assert!(merged.content.contains(r#"id="C""#) && merged.content.contains(r#"id="D""#));
//! ```
//!
//! ## Module Structure
//!
//! - **[document]** - Cell model and document parse/render
//! - **[merge]** - Edit scripts, three-way and two-way merge
//! - **[protocol]** - Payload tokens and JSON messages
//! - **[store]** - Versioned record storage contract and implementations
//! - **[server]** - Update protocol and Axum routes
//! - **[client]** - HTTP client for the routes
//! - **[error]** - Error types and result handling

pub mod client;
pub mod document;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod server;
pub mod store;

pub use client::{ClientConfig, WhiteboardClient};
pub use document::Cell;
pub use error::{Result, WhiteboardError};
pub use merge::{DocumentMerger, MergeOutcome, MergeResolution};
pub use protocol::{decode, encode};
pub use server::{ServerConfig, WhiteboardService};
pub use store::{CachedStore, InMemoryStore, Record, WhiteboardStore, WriteOutcome};

#[cfg(test)]
mod tests;
