//! Positional two-way merge, used only when no ancestor is available.

use crate::document::Cell;
use std::collections::HashSet;

/// Reconcile `old` and `new` position by position.
///
/// Equal cells are kept once and `new` wins any mismatch. Once the shorter
/// sequence runs out, the rest of the longer one is appended. No identifier
/// is ever emitted twice.
pub fn merge_cells(old: &[Cell], new: &[Cell]) -> Vec<Cell> {
    let mut merged = Vec::with_capacity(old.len().max(new.len()));
    let mut emitted: HashSet<String> = HashSet::new();

    let mut emit = |cell: &Cell, merged: &mut Vec<Cell>| {
        if emitted.insert(cell.id().to_string()) {
            merged.push(cell.clone());
        }
    };

    for (old_cell, new_cell) in old.iter().zip(new) {
        if old_cell == new_cell {
            emit(old_cell, &mut merged);
        } else {
            emit(new_cell, &mut merged);
        }
    }

    let common = old.len().min(new.len());
    let remainder = if old.len() > new.len() {
        &old[common..]
    } else {
        &new[common..]
    };
    for cell in remainder {
        emit(cell, &mut merged);
    }

    merged
}
