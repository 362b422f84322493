//! Merge algorithms for reconciling concurrent whiteboard edits.
//!
//! Whiteboards are treated as ordered lists of opaque, identifier-bearing
//! cells. Two merge modes exist:
//!
//! | Mode | Inputs | Conflict policy |
//! |------|--------|-----------------|
//! | Three-way | ancestor, old, new | combine when cell ids are disjoint, else new wins |
//! | Two-way | old, new | positional, new wins any mismatch |
//!
//! The three-way mode is used whenever the ancestor is known; the two-way mode
//! is a fallback for callers that do not track which version they edited.
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DocumentMerger`] | Text-in, text-out merge entry point |
//! | [`MergeOutcome`] | Merged document plus how it was resolved |
//! | [`diff::EditScript`] | Myers edit script over cells |
//!
//! # Examples
//!
//! ```
//! use whiteboard_sync::merge::DocumentMerger;
//!
//! let ancestor = r#"<mxGraphModel><root><mxCell id="0"/></root></mxGraphModel>"#;
//! let old = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="a"/></root></mxGraphModel>"#;
//! let new = r#"<mxGraphModel><root><mxCell id="0"/><mxCell id="b"/></root></mxGraphModel>"#;
//!
//! let merged = DocumentMerger::new().merge(ancestor, old, new).unwrap();
//! assert!(merged.content.contains(r#"id="a""#));
//! assert!(merged.content.contains(r#"id="b""#));
//! ```
//!
//! Ordering between insertions made by different branches at the same spot
//! only affects z-order and is not guaranteed beyond being deterministic.

pub mod diff;
pub mod three_way;
pub mod two_way;

pub use three_way::Resolution;

use crate::document::{parse, render};
use crate::error::Result;
use tracing::debug;

/// Result of merging whiteboard documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Rendered merged document
    pub content: String,
    /// How concurrent edits were reconciled
    pub resolution: MergeResolution,
}

/// Which path produced a [`MergeOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResolution {
    /// Three-way merge with disjoint edits
    Combined,
    /// Three-way merge where the new branch clobbered the old one
    NewWins,
    /// Positional two-way fallback
    Positional,
}

impl From<Resolution> for MergeResolution {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Combined => MergeResolution::Combined,
            Resolution::NewWins => MergeResolution::NewWins,
        }
    }
}

/// Merges MxGraph documents given as text.
///
/// Stateless; one instance can be shared by every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMerger;

impl DocumentMerger {
    /// Create a merger.
    pub fn new() -> Self {
        DocumentMerger
    }

    /// Three-way merge of `old` and `new`, both edited from `ancestor`.
    ///
    /// # Errors
    ///
    /// - [`crate::WhiteboardError::Parse`] / [`crate::WhiteboardError::MalformedElement`]
    ///   if any input fails to parse
    /// - [`crate::WhiteboardError::PatchApplication`] on an internal invariant violation
    pub fn merge(&self, ancestor: &str, old: &str, new: &str) -> Result<MergeOutcome> {
        let ancestor_cells = parse(ancestor)?;
        let old_cells = parse(old)?;
        let new_cells = parse(new)?;
        debug!(
            ancestor = ancestor_cells.len(),
            old = old_cells.len(),
            new = new_cells.len(),
            "parsed documents for three-way merge"
        );

        let (merged, resolution) = three_way::merge_cells(&ancestor_cells, &old_cells, &new_cells)?;
        Ok(MergeOutcome {
            content: render(&merged)?,
            resolution: resolution.into(),
        })
    }

    /// Positional two-way merge, for when no ancestor is available.
    ///
    /// # Errors
    ///
    /// Parse errors from either input.
    pub fn merge_two_way(&self, old: &str, new: &str) -> Result<MergeOutcome> {
        let old_cells = parse(old)?;
        let new_cells = parse(new)?;
        let merged = two_way::merge_cells(&old_cells, &new_cells);
        Ok(MergeOutcome {
            content: render(&merged)?,
            resolution: MergeResolution::Positional,
        })
    }
}
