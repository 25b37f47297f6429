//! Named cell ranges anchored to sequence content.
//!
//! A range is stored as a tracked interval between the markers of its two
//! corners, not as coordinates. Rows inserted or removed elsewhere move the
//! markers, and resolving the range maps their current positions back
//! through the current grid shape.
//!
//! The intervals live in the sequence's shared collection under the range
//! label, so every session sees the same named ranges.

use std::fmt;

use tabledoc_engine::CellRef;
use tracing::debug;

use super::GridIndex;
use crate::error::{Result, TableError};
use crate::sequence::{ActorId, IntervalHandle, Sequence, SequenceError};

/// A rectangle of cells, corners inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl CellRange {
    pub fn new(min_row: usize, min_col: usize, max_row: usize, max_col: usize) -> Self {
        CellRange {
            min_row,
            min_col,
            max_row,
            max_col,
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            CellRef::new(self.min_row, self.min_col),
            CellRef::new(self.max_row, self.max_col)
        )
    }
}

/// Name `range` under `label`, replacing any range already using it.
pub fn create_range<Q: Sequence + ?Sized>(
    sequence: &mut Q,
    actor: ActorId,
    label: &str,
    range: CellRange,
) -> Result<()> {
    let index = GridIndex::from_sequence(&*sequence)?;
    let start = index.to_position(range.min_row, range.min_col)?;
    let end = index.to_position(range.max_row, range.max_col)?;

    sequence.create_tracked_interval(&IntervalHandle::new(label), start, end, actor)?;
    debug!(label, %range, start, end, "range created");
    Ok(())
}

pub fn resolve_range<Q: Sequence + ?Sized>(sequence: &Q, label: &str) -> Result<CellRange> {
    let (start, end) = sequence
        .resolve_tracked_interval(&IntervalHandle::new(label))
        .map_err(|err| not_found(err, label))?;

    let index = GridIndex::from_sequence(sequence)?;
    let (min_row, min_col) = index.to_row_col(start)?;
    let (max_row, max_col) = index.to_row_col(end)?;
    Ok(CellRange::new(min_row, min_col, max_row, max_col))
}

pub fn remove_range<Q: Sequence + ?Sized>(sequence: &mut Q, actor: ActorId, label: &str) -> Result<()> {
    sequence
        .release_tracked_interval(&IntervalHandle::new(label), actor)
        .map_err(|err| not_found(err, label))?;
    debug!(label, "range removed");
    Ok(())
}

/// Labels of every named range, sorted.
pub fn range_labels<Q: Sequence + ?Sized>(sequence: &Q) -> Vec<String> {
    sequence
        .tracked_intervals()
        .iter()
        .map(|handle| handle.label().to_string())
        .collect()
}

fn not_found(err: SequenceError, label: &str) -> TableError {
    match err {
        SequenceError::UnknownInterval(_) => TableError::RangeNotFound(label.to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::replace_cell_text;
    use crate::sequence::{Marker, MemorySequence};
    use pretty_assertions::assert_eq;

    const ME: ActorId = ActorId(1);

    fn grid(rows: usize, cols: usize) -> MemorySequence {
        let mut seq = MemorySequence::new(ME);
        seq.set_stride(cols, ME).unwrap();
        for _ in 0..rows * cols {
            seq.insert_at(0, Marker::default(), ME).unwrap();
        }
        seq
    }

    fn insert_rows(seq: &mut MemorySequence, at: usize, count: usize) {
        let cols = seq.stride();
        for _ in 0..count * cols {
            seq.insert_at(at * cols, Marker::default(), ME).unwrap();
        }
    }

    #[test]
    fn test_range_tracks_rows_inserted_above() {
        let mut seq = grid(7, 8);
        create_range(&mut seq, ME, "block", CellRange::new(0, 0, 1, 1)).unwrap();

        insert_rows(&mut seq, 0, 2);
        assert_eq!(
            resolve_range(&seq, "block").unwrap(),
            CellRange::new(2, 0, 3, 1)
        );
    }

    #[test]
    fn test_range_unaffected_by_rows_inserted_below() {
        let mut seq = grid(7, 8);
        create_range(&mut seq, ME, "block", CellRange::new(1, 2, 3, 4)).unwrap();
        insert_rows(&mut seq, 5, 1);
        assert_eq!(
            resolve_range(&seq, "block").unwrap(),
            CellRange::new(1, 2, 3, 4)
        );
    }

    #[test]
    fn test_range_survives_corner_cell_writes() {
        let mut seq = grid(3, 3);
        create_range(&mut seq, ME, "r", CellRange::new(0, 0, 2, 2)).unwrap();
        replace_cell_text(&mut seq, ME, 0, 0, "top").unwrap();
        replace_cell_text(&mut seq, ME, 2, 2, "bottom").unwrap();
        assert_eq!(resolve_range(&seq, "r").unwrap(), CellRange::new(0, 0, 2, 2));
    }

    #[test]
    fn test_same_label_overwrites() {
        let mut seq = grid(4, 4);
        create_range(&mut seq, ME, "r", CellRange::new(0, 0, 1, 1)).unwrap();
        create_range(&mut seq, ME, "r", CellRange::new(2, 2, 3, 3)).unwrap();
        assert_eq!(range_labels(&seq), vec!["r".to_string()]);
        assert_eq!(resolve_range(&seq, "r").unwrap(), CellRange::new(2, 2, 3, 3));
    }

    #[test]
    fn test_unknown_label_is_not_found() {
        let mut seq = grid(7, 8);
        assert!(matches!(
            resolve_range(&seq, "totals"),
            Err(TableError::RangeNotFound(label)) if label == "totals"
        ));
        assert!(matches!(
            remove_range(&mut seq, ME, "totals"),
            Err(TableError::RangeNotFound(_))
        ));
    }

    #[test]
    fn test_removed_range_is_gone() {
        let mut seq = grid(2, 2);
        create_range(&mut seq, ME, "a", CellRange::new(0, 0, 0, 0)).unwrap();
        create_range(&mut seq, ME, "b", CellRange::new(1, 1, 1, 1)).unwrap();
        remove_range(&mut seq, ME, "a").unwrap();
        assert_eq!(range_labels(&seq), vec!["b".to_string()]);
    }

    #[test]
    fn test_corners_outside_grid_are_rejected() {
        let mut seq = grid(2, 2);
        assert!(matches!(
            create_range(&mut seq, ME, "r", CellRange::new(0, 0, 2, 0)),
            Err(TableError::OutOfRange { .. })
        ));
        assert!(range_labels(&seq).is_empty());
    }

    #[test]
    fn test_display_uses_a1_corners() {
        assert_eq!(CellRange::new(0, 0, 1, 1).to_string(), "A1:B2");
        assert_eq!(CellRange::new(2, 1, 4, 3).to_string(), "B3:D5");
    }
}
