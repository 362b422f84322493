//! LRU read-through cache for versioned records.
//!
//! Only exact-version reads are cached: a record at a given version never
//! changes, so those entries cannot go stale. Reads of the newest version
//! always go to the inner store, and a commit evicts every cached entry for
//! its identifier.

use super::{Record, WhiteboardStore, WriteOutcome};
use crate::error::Result;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::trace;

type CacheKey = (String, u64);

/// Wraps a store with an LRU cache of `(identifier, version)` records.
pub struct CachedStore<S> {
    inner: S,
    records: Mutex<LruCache<CacheKey, Record>>,
}

impl<S: WhiteboardStore> CachedStore<S> {
    /// Cache up to `capacity` records in front of `inner`.
    pub fn new(inner: S, capacity: NonZeroUsize) -> Self {
        CachedStore {
            inner,
            records: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached records.
    pub fn cached_len(&self) -> usize {
        self.records.lock().len()
    }

    fn invalidate(&self, identifier: &str) {
        let mut records = self.records.lock();
        let stale: Vec<CacheKey> = records
            .iter()
            .filter(|((id, _), _)| id == identifier)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            records.pop(&key);
        }
    }
}

#[async_trait]
impl<S: WhiteboardStore> WhiteboardStore for CachedStore<S> {
    async fn get(&self, identifier: &str, version: u64) -> Result<Option<Record>> {
        let key = (identifier.to_string(), version);
        let hit = self.records.lock().get(&key).cloned();
        if hit.is_some() {
            trace!(identifier, version, "record cache hit");
            return Ok(hit);
        }

        let record = self.inner.get(identifier, version).await?;
        if let Some(record) = &record {
            self.records.lock().put(key, record.clone());
        }
        Ok(record)
    }

    async fn get_newest(&self, identifier: &str) -> Result<Option<Record>> {
        self.inner.get_newest(identifier).await
    }

    async fn put_if_absent(&self, record: Record) -> Result<WriteOutcome> {
        let identifier = record.identifier.clone();
        let outcome = self.inner.put_if_absent(record).await?;
        if outcome == WriteOutcome::Committed {
            self.invalidate(&identifier);
        }
        Ok(outcome)
    }

    async fn put_if_version_matches(
        &self,
        record: Record,
        expected_prior_version: u64,
    ) -> Result<WriteOutcome> {
        let identifier = record.identifier.clone();
        let outcome = self
            .inner
            .put_if_version_matches(record, expected_prior_version)
            .await?;
        if outcome == WriteOutcome::Committed {
            self.invalidate(&identifier);
        }
        Ok(outcome)
    }
}
