//! MxGraph whiteboard documents as ordered sequences of cells.
//!
//! | Type / fn | Description |
//! |-----------|-------------|
//! | [`Cell`] | Immutable cell with structural equality and a stable id |
//! | [`XmlElement`] | Plain value tree a cell is built from |
//! | [`parse`] | Document text to cells |
//! | [`render`] | Cells to document text |

mod cell;
mod codec;

pub use cell::{Cell, XmlElement, XmlNode, ID_ATTRIBUTE};
pub use codec::{parse, render, CELL_TAG, MAX_NESTING_DEPTH, MODEL_TAG, ROOT_TAG};
