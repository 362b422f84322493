//! Three-way merge of cell sequences against a common ancestor.
//!
//! Both branches are diffed against the ancestor. When no identifier is
//! touched by both scripts the edits are combined; otherwise the new branch
//! wins outright and the old branch's edits are discarded for this merge.

use super::diff::{diff, touched_ids, Edit, EditScript};
use crate::document::Cell;
use crate::error::{Result, WhiteboardError};
use tracing::{debug, info};

/// How a three-way merge was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Branches touched disjoint identifiers; both sets of edits kept
    Combined,
    /// At least one identifier touched by both branches; new branch won
    NewWins,
}

/// Merge `old` and `new`, both derived from `ancestor`.
///
/// Returns the merged sequence and how the merge was resolved.
///
/// # Errors
///
/// [`WhiteboardError::PatchApplication`] if a computed script fails to apply
/// to the ancestor, which indicates a bug in the differencer.
pub fn merge_cells(
    ancestor: &[Cell],
    old: &[Cell],
    new: &[Cell],
) -> Result<(Vec<Cell>, Resolution)> {
    let old_script = diff(ancestor, old);
    let new_script = diff(ancestor, new);

    let old_ids = touched_ids(&old_script);
    let new_ids = touched_ids(&new_script);
    let overlap = old_ids.intersection(&new_ids).count();

    debug!(
        ancestor = ancestor.len(),
        old_touched = old_ids.len(),
        new_touched = new_ids.len(),
        overlap,
        "three-way merge scripts computed"
    );

    if overlap == 0 {
        info!("no overlapping cell ids, combining both branches");
        let merged = apply_layered(ancestor, &new_script, &old_script)?;
        return Ok((merged, Resolution::Combined));
    }

    // TODO: narrow the fallback to the conflicting ids and keep the old
    // branch's edits to every other cell.
    info!(overlap, "overlapping cell ids, new branch clobbers old branch");
    let merged = super::diff::apply(ancestor, &new_script)?;
    Ok((merged, Resolution::NewWins))
}

/// Apply `new_script` to `ancestor` and rebase `old_script` on top of it.
///
/// Both scripts are walked against the ancestor in one pass. An ancestor
/// cell survives only if both branches keep it. Insertions into the same
/// ancestor gap are emitted old branch first.
fn apply_layered(ancestor: &[Cell], new_script: &EditScript, old_script: &EditScript) -> Result<Vec<Cell>> {
    let mut merged = Vec::with_capacity(ancestor.len());
    let mut new_ops = new_script.iter().peekable();
    let mut old_ops = old_script.iter().peekable();

    for position in 0..=ancestor.len() {
        while let Some(Edit::Insert(cell)) = old_ops.peek() {
            merged.push(cell.clone());
            old_ops.next();
        }
        while let Some(Edit::Insert(cell)) = new_ops.peek() {
            merged.push(cell.clone());
            new_ops.next();
        }

        let Some(base) = ancestor.get(position) else {
            break;
        };
        let kept_by_old = consume(&mut old_ops, base, position, "old")?;
        let kept_by_new = consume(&mut new_ops, base, position, "new")?;
        if kept_by_old && kept_by_new {
            merged.push(base.clone());
        }
    }

    if new_ops.next().is_some() || old_ops.next().is_some() {
        return Err(WhiteboardError::PatchApplication(
            "edit script extends past the end of the ancestor".into(),
        ));
    }
    Ok(merged)
}

/// Consume the step for ancestor cell `base`; returns whether it was kept.
fn consume<'a, I>(
    ops: &mut std::iter::Peekable<I>,
    base: &Cell,
    position: usize,
    branch: &str,
) -> Result<bool>
where
    I: Iterator<Item = &'a Edit>,
{
    match ops.next() {
        Some(Edit::Keep(cell)) if cell == base => Ok(true),
        Some(Edit::Delete(cell)) if cell == base => Ok(false),
        Some(edit) => Err(WhiteboardError::PatchApplication(format!(
            "{} script has '{}' where ancestor position {} holds '{}'",
            branch,
            edit.cell().id(),
            position,
            base.id()
        ))),
        None => Err(WhiteboardError::PatchApplication(format!(
            "{} script ends before ancestor position {}",
            branch, position
        ))),
    }
}
