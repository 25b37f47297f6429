//! Cell text storage in sequence markers.
//!
//! Each cell is exactly one marker. Writing a cell swaps its marker for a
//! fresh one at the same position, so the sequence length, and with it every
//! other cell's coordinates, is unchanged by a write.

use tracing::trace;

use super::GridIndex;
use crate::error::{Result, TableError};
use crate::sequence::{ActorId, Marker, Sequence};

/// Read the text of `(row, col)` as of the sequence's current version.
pub fn cell_text<Q: Sequence + ?Sized>(sequence: &Q, row: usize, col: usize) -> Result<String> {
    let position = GridIndex::from_sequence(sequence)?.to_position(row, col)?;
    let marker = sequence.get_at(position, sequence.version())?;
    Ok(marker.value)
}

/// Replace the marker of `(row, col)` with one carrying `text`.
///
/// The replacement is inserted in front of the old marker before the old
/// one is removed; anchors on the old marker then settle on the new one.
pub fn replace_cell_text<Q: Sequence + ?Sized>(
    sequence: &mut Q,
    actor: ActorId,
    row: usize,
    col: usize,
    text: &str,
) -> Result<()> {
    let index = GridIndex::from_sequence(sequence)?;
    let position = index.to_position(row, col)?;

    sequence.insert_at(position, Marker::new(text), actor)?;
    sequence.delete_range(position + 1, position + 2, actor)?;

    let length = sequence.length(sequence.version())?;
    if length != index.len() {
        return Err(TableError::StructuralViolation {
            length,
            cols: index.num_cols(),
        });
    }
    trace!(row, col, position, %actor, "cell marker replaced");
    Ok(())
}

/// Cell reads and writes on behalf of one actor.
pub struct CellStore<'a, Q: ?Sized> {
    sequence: &'a mut Q,
    actor: ActorId,
}

impl<'a, Q: Sequence + ?Sized> CellStore<'a, Q> {
    pub fn new(sequence: &'a mut Q, actor: ActorId) -> Self {
        CellStore { sequence, actor }
    }

    pub fn get_cell_text(&self, row: usize, col: usize) -> Result<String> {
        cell_text(&*self.sequence, row, col)
    }

    pub fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        replace_cell_text(&mut *self.sequence, self.actor, row, col, text)
    }
}
