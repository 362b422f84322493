//! Cell sequence diff: Myers O((N+M)·D) difference algorithm in linear space.
//!
//! Equality between cells is full structural equality, so a cell whose content
//! changed shows up as a `Delete` of the old cell followed by an `Insert` of
//! the new one, both carrying the same identifier.

use crate::document::Cell;
use crate::error::{Result, WhiteboardError};
use std::collections::HashSet;

/// One step of an edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Source cell retained in the target
    Keep(Cell),
    /// Cell present only in the target
    Insert(Cell),
    /// Source cell absent from the target
    Delete(Cell),
}

impl Edit {
    /// The cell this step refers to.
    pub fn cell(&self) -> &Cell {
        match self {
            Edit::Keep(cell) | Edit::Insert(cell) | Edit::Delete(cell) => cell,
        }
    }

    /// Whether this step consumes a source cell (`Keep` or `Delete`).
    #[inline]
    pub fn consumes_source(&self) -> bool {
        !matches!(self, Edit::Insert(_))
    }
}

/// Ordered edits transforming a source sequence into a target sequence.
///
/// Every source cell appears exactly once as `Keep` or `Delete`, in source order.
pub type EditScript = Vec<Edit>;

/// Compute a minimal edit script from `a` to `b`.
///
/// Within each run of changes between retained cells, deletions are emitted
/// before insertions.
///
/// # Examples
///
/// ```
/// use whiteboard_sync::document::parse;
/// use whiteboard_sync::merge::diff::{apply, diff};
///
/// let a = parse(r#"<root><mxCell id="a"/><mxCell id="b"/></root>"#).unwrap();
/// let b = parse(r#"<root><mxCell id="a"/><mxCell id="c"/><mxCell id="b"/></root>"#).unwrap();
/// let script = diff(&a, &b);
/// assert_eq!(apply(&a, &script).unwrap(), b);
/// ```
pub fn diff(a: &[Cell], b: &[Cell]) -> EditScript {
    let mut script = Vec::with_capacity(a.len().max(b.len()));
    diff_into(a, b, &mut script);
    deletes_first(script)
}

/// Trim the common affixes, then split the remainder at a middle snake.
fn diff_into(a: &[Cell], b: &[Cell], script: &mut EditScript) {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    script.extend(a[..prefix].iter().cloned().map(Edit::Keep));
    let middle_a = &a[prefix..a.len() - suffix];
    let middle_b = &b[prefix..b.len() - suffix];

    if middle_a.is_empty() {
        script.extend(middle_b.iter().cloned().map(Edit::Insert));
    } else if middle_b.is_empty() {
        script.extend(middle_a.iter().cloned().map(Edit::Delete));
    } else {
        match middle_snake(middle_a, middle_b) {
            Some((x, y)) if (x, y) != (0, 0) && (x, y) != (middle_a.len(), middle_b.len()) => {
                diff_into(&middle_a[..x], &middle_b[..y], script);
                diff_into(&middle_a[x..], &middle_b[y..], script);
            }
            _ => {
                script.extend(middle_a.iter().cloned().map(Edit::Delete));
                script.extend(middle_b.iter().cloned().map(Edit::Insert));
            }
        }
    }

    script.extend(a[a.len() - suffix..].iter().cloned().map(Edit::Keep));
}

/// Find a point on a shortest edit path by searching forward from the start
/// and backward from the end until the two frontiers overlap.
///
/// Only the furthest-reaching x per diagonal is kept for each direction, so
/// memory is linear in `a.len() + b.len()` and recursion on both halves stays
/// O(log D) deep.
fn middle_snake(a: &[Cell], b: &[Cell]) -> Option<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2 + 1;
    let offset = max_d + 1;
    let width = 2 * max_d + 3;

    let mut forward = vec![-1isize; width as usize];
    let mut backward = vec![-1isize; width as usize];
    forward[(offset + 1) as usize] = 0;
    backward[(offset + 1) as usize] = 0;

    let delta = n - m;
    let odd = delta % 2 != 0;
    // Diagonals that ran off the edit graph are skipped from then on.
    let (mut forward_start, mut forward_end) = (0, 0);
    let (mut backward_start, mut backward_end) = (0, 0);

    for d in 0..max_d {
        let mut k = -d + forward_start;
        while k <= d - forward_end {
            let idx = (offset + k) as usize;
            // Move down (insert) when on the lower diagonal edge or when the
            // upper neighbour reached further; otherwise move right (delete).
            let mut x = if k == -d || (k != d && forward[idx - 1] < forward[idx + 1]) {
                forward[idx + 1]
            } else {
                forward[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            forward[idx] = x;

            if x > n {
                forward_end += 2;
            } else if y > m {
                forward_start += 2;
            } else if odd {
                let mirror = offset + delta - k;
                if (0..width).contains(&mirror) {
                    let reached = backward[mirror as usize];
                    if reached != -1 && x >= n - reached {
                        return Some((x as usize, y as usize));
                    }
                }
            }
            k += 2;
        }

        let mut k = -d + backward_start;
        while k <= d - backward_end {
            let idx = (offset + k) as usize;
            let mut x = if k == -d || (k != d && backward[idx - 1] < backward[idx + 1]) {
                backward[idx + 1]
            } else {
                backward[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[(n - 1 - x) as usize] == b[(m - 1 - y) as usize] {
                x += 1;
                y += 1;
            }
            backward[idx] = x;

            if x > n {
                backward_end += 2;
            } else if y > m {
                backward_start += 2;
            } else if !odd {
                let forward_k = delta - k;
                let mirror = offset + forward_k;
                if (0..width).contains(&mirror) {
                    let reached = forward[mirror as usize];
                    if reached != -1 && reached >= n - x {
                        return Some((reached as usize, (reached - forward_k) as usize));
                    }
                }
            }
            k += 2;
        }
    }

    None
}

/// Move insertions behind the deletions of the same change run.
fn deletes_first(script: EditScript) -> EditScript {
    let mut ordered = Vec::with_capacity(script.len());
    let mut inserts = Vec::new();
    for edit in script {
        match edit {
            Edit::Insert(_) => inserts.push(edit),
            Edit::Delete(_) => ordered.push(edit),
            Edit::Keep(_) => {
                ordered.append(&mut inserts);
                ordered.push(edit);
            }
        }
    }
    ordered.append(&mut inserts);
    ordered
}

/// Apply `script` to `source`, verifying every consumed cell.
///
/// # Errors
///
/// [`WhiteboardError::PatchApplication`] if a `Keep` or `Delete` does not match
/// the next source cell, or if the script does not consume the whole source.
pub fn apply(source: &[Cell], script: &[Edit]) -> Result<Vec<Cell>> {
    let mut target = Vec::with_capacity(source.len());
    let mut position = 0;

    for edit in script {
        match edit {
            Edit::Insert(cell) => target.push(cell.clone()),
            Edit::Keep(cell) | Edit::Delete(cell) => {
                let expected = source.get(position).ok_or_else(|| {
                    WhiteboardError::PatchApplication(format!(
                        "script consumes cell '{}' past the end of a {}-cell source",
                        cell.id(),
                        source.len()
                    ))
                })?;
                if expected != cell {
                    return Err(WhiteboardError::PatchApplication(format!(
                        "script expects cell '{}' at position {}, found '{}'",
                        cell.id(),
                        position,
                        expected.id()
                    )));
                }
                if let Edit::Keep(_) = edit {
                    target.push(expected.clone());
                }
                position += 1;
            }
        }
    }

    if position != source.len() {
        return Err(WhiteboardError::PatchApplication(format!(
            "script consumed {} of {} source cells",
            position,
            source.len()
        )));
    }
    Ok(target)
}

/// Identifiers of every cell the script inserts or deletes.
pub fn touched_ids(script: &[Edit]) -> HashSet<&str> {
    script
        .iter()
        .filter(|edit| !matches!(edit, Edit::Keep(_)))
        .map(|edit| edit.cell().id())
        .collect()
}
