//! In-memory whiteboard store with compare-and-swap writes.
//!
//! Keeps every version of every whiteboard in a registry guarded by a single
//! `RwLock`, so each conditional write is atomic with respect to all readers
//! and writers.

use super::{Record, WhiteboardStore, WriteOutcome};
use crate::error::{Result, WhiteboardError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

type History = BTreeMap<u64, Record>;

/// Thread-safe registry of whiteboard histories.
///
/// Cloning creates a new handle to the same underlying records.
///
/// # Examples
///
/// ```
/// use whiteboard_sync::store::{InMemoryStore, Record, WhiteboardStore, WriteOutcome};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryStore::new();
/// let outcome = store.put_if_absent(Record::initial("board")).await.unwrap();
/// assert_eq!(outcome, WriteOutcome::Committed);
///
/// let newest = store.get_newest("board").await.unwrap().unwrap();
/// assert_eq!(newest.version, 1);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    /// Identifier → version → record
    whiteboards: Arc<RwLock<HashMap<String, History>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// List all identifiers, in arbitrary order.
    pub fn list_identifiers(&self) -> Vec<String> {
        self.whiteboards.read().keys().cloned().collect()
    }

    /// All stored versions of one whiteboard, ascending.
    pub fn versions(&self, identifier: &str) -> Vec<u64> {
        self.whiteboards
            .read()
            .get(identifier)
            .map(|history| history.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every version older than `keep_from`, as a compacting store would.
    pub fn compact(&self, identifier: &str, keep_from: u64) {
        if let Some(history) = self.whiteboards.write().get_mut(identifier) {
            *history = history.split_off(&keep_from);
        }
    }
}

#[async_trait]
impl WhiteboardStore for InMemoryStore {
    async fn get(&self, identifier: &str, version: u64) -> Result<Option<Record>> {
        Ok(self
            .whiteboards
            .read()
            .get(identifier)
            .and_then(|history| history.get(&version))
            .cloned())
    }

    async fn get_newest(&self, identifier: &str) -> Result<Option<Record>> {
        Ok(self
            .whiteboards
            .read()
            .get(identifier)
            .and_then(|history| history.values().next_back())
            .cloned())
    }

    async fn put_if_absent(&self, record: Record) -> Result<WriteOutcome> {
        let mut whiteboards = self.whiteboards.write();
        let history = whiteboards.entry(record.identifier.clone()).or_default();
        if history.contains_key(&record.version) {
            return Ok(WriteOutcome::AlreadyExists);
        }
        debug!(identifier = %record.identifier, version = record.version, "stored new record");
        history.insert(record.version, record);
        Ok(WriteOutcome::Committed)
    }

    async fn put_if_version_matches(
        &self,
        record: Record,
        expected_prior_version: u64,
    ) -> Result<WriteOutcome> {
        if record.version != expected_prior_version + 1 {
            return Err(WhiteboardError::Store(format!(
                "record version {} does not follow expected version {}",
                record.version, expected_prior_version
            )));
        }

        let mut whiteboards = self.whiteboards.write();
        let history = whiteboards.entry(record.identifier.clone()).or_default();
        let newest = history.keys().next_back().copied();
        if newest != Some(expected_prior_version) {
            debug!(
                identifier = %record.identifier,
                expected = expected_prior_version,
                actual = ?newest,
                "conditional write lost"
            );
            return Ok(WriteOutcome::VersionConflict);
        }
        history.insert(record.version, record);
        Ok(WriteOutcome::Committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_whiteboard() {
        let store = InMemoryStore::new();
        assert!(store.get_newest("nope").await.unwrap().is_none());
        assert!(store.get("nope", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_if_absent_once() {
        let store = InMemoryStore::new();
        assert_eq!(
            store.put_if_absent(Record::initial("doc")).await.unwrap(),
            WriteOutcome::Committed
        );
        assert_eq!(
            store.put_if_absent(Record::new("doc", 1, "other")).await.unwrap(),
            WriteOutcome::AlreadyExists
        );
        assert_eq!(store.get("doc", 1).await.unwrap().unwrap().content, "");
    }

    #[tokio::test]
    async fn test_conditional_write() {
        let store = InMemoryStore::new();
        let _ = store.put_if_absent(Record::initial("doc")).await.unwrap();

        let outcome = store
            .put_if_version_matches(Record::new("doc", 2, "a"), 1)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Committed);

        // A second writer that also read version 1 loses.
        let outcome = store
            .put_if_version_matches(Record::new("doc", 2, "b"), 1)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::VersionConflict);

        let newest = store.get_newest("doc").await.unwrap().unwrap();
        assert_eq!((newest.version, newest.content.as_str()), (2, "a"));
        assert_eq!(store.versions("doc"), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_conditional_write_rejects_version_gap() {
        let store = InMemoryStore::new();
        let result = store
            .put_if_version_matches(Record::new("doc", 5, "a"), 1)
            .await;
        assert!(matches!(result, Err(WhiteboardError::Store(_))));
    }

    #[tokio::test]
    async fn test_compact_drops_old_versions() {
        let store = InMemoryStore::new();
        let _ = store.put_if_absent(Record::initial("doc")).await.unwrap();
        let _ = store.put_if_version_matches(Record::new("doc", 2, "a"), 1).await.unwrap();
        store.compact("doc", 2);
        assert!(store.get("doc", 1).await.unwrap().is_none());
        assert_eq!(store.get_newest("doc").await.unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_clone_shares_state() {
        let store1 = InMemoryStore::new();
        let store2 = store1.clone();
        tokio_test::block_on(async {
            let _ = store1.put_if_absent(Record::initial("doc")).await.unwrap();
        });
        assert_eq!(store2.list_identifiers(), vec!["doc".to_string()]);
    }
}
