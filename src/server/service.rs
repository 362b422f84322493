//! Versioned read-modify-write protocol for whiteboard updates.
//!
//! Each update runs the cycle
//!
//! ```text
//! READ_NEWEST -> DECIDE -> (FAST_ACCEPT | MERGE) -> CONDITIONAL_WRITE
//!                                                      |-> committed
//!                                                      |-> lost race: restart at READ_NEWEST
//!                                                      '-> budget spent: ConcurrentUpdateExhausted
//! ```
//!
//! No in-process locking is done here. Two requests for the same whiteboard
//! only contend at the conditional write, and the loser redoes the whole
//! cycle because the newest content may change its merge decision.

use crate::document::parse;
use crate::error::{Result, WhiteboardError};
use crate::merge::{DocumentMerger, MergeResolution};
use crate::protocol::{
    decode_with_limit, encode, GetWhiteboardResponse, SetWhiteboardRequest,
    SetWhiteboardResponse, DEFAULT_MAX_DOCUMENT_BYTES,
};
use crate::store::{Record, WhiteboardStore, WriteOutcome};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default number of read-merge-write cycles before giving up.
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 3;

/// What the decide step chose to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The client edited the newest version; its content is checked and then
    /// stored verbatim
    FastAccept(String),
    /// The client edited an older version (or none); content was merged
    Merged {
        /// Encoded merged content
        content: String,
        /// Merge path taken
        resolution: MergeResolution,
    },
}

impl Decision {
    fn into_content(self) -> String {
        match self {
            Decision::FastAccept(content) => content,
            Decision::Merged { content, .. } => content,
        }
    }
}

/// Fetch and update operations over an injected store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use whiteboard_sync::server::WhiteboardService;
/// use whiteboard_sync::store::InMemoryStore;
///
/// # tokio_test::block_on(async {
/// let service = WhiteboardService::new(Arc::new(InMemoryStore::new()));
/// let board = service.fetch("board-1").await.unwrap();
/// assert_eq!(board.version, 1);
/// assert_eq!(board.content, "");
/// # });
/// ```
#[derive(Clone)]
pub struct WhiteboardService {
    store: Arc<dyn WhiteboardStore>,
    merger: DocumentMerger,
    max_update_attempts: u32,
    max_document_bytes: usize,
}

impl WhiteboardService {
    /// Create a service with the default retry budget.
    pub fn new(store: Arc<dyn WhiteboardStore>) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_UPDATE_ATTEMPTS)
    }

    /// Create a service allowing `max_update_attempts` cycles per update (at least 1).
    pub fn with_max_attempts(store: Arc<dyn WhiteboardStore>, max_update_attempts: u32) -> Self {
        WhiteboardService {
            store,
            merger: DocumentMerger::new(),
            max_update_attempts: max_update_attempts.max(1),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    /// Cap the inflated size of every document this service decodes.
    pub fn with_max_document_bytes(mut self, max_document_bytes: usize) -> Self {
        self.max_document_bytes = max_document_bytes;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn WhiteboardStore> {
        &self.store
    }

    /// Return the newest version, creating version 1 on first access.
    pub async fn fetch(&self, identifier: &str) -> Result<GetWhiteboardResponse> {
        let record = self.read_newest(identifier).await?;
        info!(identifier, version = record.version, "fetched whiteboard");
        Ok(GetWhiteboardResponse {
            identifier: record.identifier,
            content: record.content,
            version: record.version,
        })
    }

    /// Commit a candidate document as the next version, merging if needed.
    ///
    /// # Errors
    ///
    /// - [`WhiteboardError::SourceVersionNotFound`] if the source version cannot be read
    /// - [`WhiteboardError::ConcurrentUpdateExhausted`] if every attempt lost a race
    /// - parse/encoding errors if the candidate (or a stored version it is
    ///   merged with) does not decode to a well-formed document
    pub async fn update(&self, request: SetWhiteboardRequest) -> Result<SetWhiteboardResponse> {
        let identifier = request.identifier.as_str();
        info!(identifier, source_version = ?request.source_version, "update requested");

        for attempt in 1..=self.max_update_attempts {
            let newest = self.read_newest(identifier).await?;
            let decision = self.decide(&request, &newest).await?;
            if let Decision::Merged { resolution, .. } = &decision {
                info!(identifier, newest = newest.version, ?resolution, "merged concurrent edits");
            }

            let next = Record::new(identifier, newest.version + 1, decision.into_content());
            match self
                .store
                .put_if_version_matches(next.clone(), newest.version)
                .await?
            {
                WriteOutcome::Committed => {
                    info!(identifier, version = next.version, attempt, "committed whiteboard");
                    return Ok(SetWhiteboardResponse {
                        identifier: next.identifier,
                        content: next.content,
                        request_source_version: request.source_version,
                        existing_newest_version: newest.version,
                        committed_version: next.version,
                    });
                }
                WriteOutcome::VersionConflict | WriteOutcome::AlreadyExists => {
                    warn!(
                        identifier,
                        attempt,
                        read_version = newest.version,
                        "lost conditional write, restarting update"
                    );
                }
            }
        }

        Err(WhiteboardError::ConcurrentUpdateExhausted {
            identifier: identifier.to_string(),
            attempts: self.max_update_attempts,
        })
    }

    /// Read the newest record, initializing version 1 if none exists.
    async fn read_newest(&self, identifier: &str) -> Result<Record> {
        if let Some(record) = self.store.get_newest(identifier).await? {
            return Ok(record);
        }

        match self.store.put_if_absent(Record::initial(identifier)).await? {
            WriteOutcome::Committed => {
                info!(identifier, "created whiteboard");
                Ok(Record::initial(identifier))
            }
            _ => {
                // A concurrent first access created it; read theirs.
                debug!(identifier, "whiteboard created concurrently");
                self.store.get_newest(identifier).await?.ok_or_else(|| {
                    WhiteboardError::Store(format!(
                        "whiteboard '{}' exists but has no readable version",
                        identifier
                    ))
                })
            }
        }
    }

    /// Choose between storing the candidate verbatim and merging it.
    pub async fn decide(&self, request: &SetWhiteboardRequest, newest: &Record) -> Result<Decision> {
        let identifier = request.identifier.as_str();

        let source_version = match request.source_version {
            Some(version) if version == newest.version => {
                // Stored versions must stay decodable for later merges.
                parse(&self.decode(&request.content)?)?;
                debug!(identifier, version, "source is newest, fast accept");
                return Ok(Decision::FastAccept(request.content.clone()));
            }
            Some(version) => version,
            None => {
                debug!(identifier, newest = newest.version, "no source version, two-way merge");
                let outcome = self
                    .merger
                    .merge_two_way(
                        &self.decode(&newest.content)?,
                        &self.decode(&request.content)?,
                    )
                    .map_err(|e| log_internal(identifier, e))?;
                return Ok(Decision::Merged {
                    content: encode(&outcome.content)?,
                    resolution: outcome.resolution,
                });
            }
        };

        if source_version == 0 || source_version > newest.version {
            return Err(WhiteboardError::SourceVersionNotFound {
                identifier: identifier.to_string(),
                version: source_version,
            });
        }

        let source = self
            .store
            .get(identifier, source_version)
            .await?
            .ok_or_else(|| WhiteboardError::SourceVersionNotFound {
                identifier: identifier.to_string(),
                version: source_version,
            })?;

        debug!(identifier, source_version, newest = newest.version, "three-way merge");
        let outcome = self
            .merger
            .merge(
                &self.decode(&source.content)?,
                &self.decode(&newest.content)?,
                &self.decode(&request.content)?,
            )
            .map_err(|e| log_internal(identifier, e))?;

        Ok(Decision::Merged {
            content: encode(&outcome.content)?,
            resolution: outcome.resolution,
        })
    }

    fn decode(&self, token: &str) -> Result<String> {
        decode_with_limit(token, self.max_document_bytes)
    }
}

fn log_internal(identifier: &str, err: WhiteboardError) -> WhiteboardError {
    if let WhiteboardError::PatchApplication(detail) = &err {
        error!(identifier, detail = %detail, "merge invariant violated");
    }
    err
}
