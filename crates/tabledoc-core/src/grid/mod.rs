//! Grid view over the marker sequence.
//!
//! - [`GridIndex`] - `(row, col)` ↔ position mapping for the current shape
//! - [`CellStore`] - cell text reads and replace-writes through the sequence
//! - [`create_range`] and friends - named rectangles anchored to sequence content

mod index;
mod range;
mod store;

pub use index::GridIndex;
pub use range::{CellRange, create_range, range_labels, remove_range, resolve_range};
pub use store::{CellStore, cell_text, replace_cell_text};
