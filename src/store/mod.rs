//! Persistent whiteboard record storage.
//!
//! The versioned update protocol only needs four operations from a store,
//! expressed by [`WhiteboardStore`]. Correctness under concurrency rests
//! entirely on the two conditional writes behaving as compare-and-swap.
//!
//! | Implementation | Description |
//! |----------------|-------------|
//! | [`InMemoryStore`] | Process-local store, for tests and single-node use |
//! | [`CachedStore`] | LRU read-through cache over any store |

mod cache;
mod memory;

pub use cache::CachedStore;
pub use memory::InMemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One stored version of a whiteboard.
///
/// At most one record exists per `(identifier, version)`; records are never
/// modified once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Whiteboard identifier
    pub identifier: String,
    /// Version, starting at 1 and increasing by exactly 1 per commit
    pub version: u64,
    /// Payload token
    pub content: String,
}

impl Record {
    /// Create a record.
    pub fn new(identifier: impl Into<String>, version: u64, content: impl Into<String>) -> Self {
        Record {
            identifier: identifier.into(),
            version,
            content: content.into(),
        }
    }

    /// The version-1 record created on first access: empty content.
    pub fn initial(identifier: impl Into<String>) -> Self {
        Record::new(identifier, 1, String::new())
    }
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum WriteOutcome {
    /// The record was written
    Committed,
    /// `put_if_absent`: a record with that identifier and version exists
    AlreadyExists,
    /// `put_if_version_matches`: the newest version is no longer the expected one
    VersionConflict,
}

/// Storage contract used by the versioned update protocol.
#[async_trait]
pub trait WhiteboardStore: Send + Sync {
    /// Read the record at exactly `version`.
    async fn get(&self, identifier: &str, version: u64) -> Result<Option<Record>>;

    /// Read the record with the highest version.
    async fn get_newest(&self, identifier: &str) -> Result<Option<Record>>;

    /// Write `record` unless one with the same identifier and version exists.
    ///
    /// Returns `Committed` or `AlreadyExists`.
    async fn put_if_absent(&self, record: Record) -> Result<WriteOutcome>;

    /// Write `record` only if the newest stored version is `expected_prior_version`.
    ///
    /// `record.version` must be `expected_prior_version + 1`.
    /// Returns `Committed` or `VersionConflict`.
    async fn put_if_version_matches(
        &self,
        record: Record,
        expected_prior_version: u64,
    ) -> Result<WriteOutcome>;
}
