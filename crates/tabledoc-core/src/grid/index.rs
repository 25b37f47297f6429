use crate::error::{Result, TableError};
use crate::sequence::Sequence;

/// Shape of the grid derived from a sequence length and stride.
///
/// Never cached across edits: build one from the sequence whenever a
/// coordinate has to be mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndex {
    num_rows: usize,
    num_cols: usize,
}

impl GridIndex {
    /// Derive the shape. The column count is the stride clamped to the
    /// length; an empty sequence is a 0×0 grid.
    pub fn new(length: usize, stride: usize) -> Result<Self> {
        if length == 0 {
            return Ok(GridIndex {
                num_rows: 0,
                num_cols: 0,
            });
        }
        let num_cols = stride.min(length);
        if num_cols == 0 || length % num_cols != 0 {
            return Err(TableError::StructuralViolation {
                length,
                cols: num_cols,
            });
        }
        Ok(GridIndex {
            num_rows: length / num_cols,
            num_cols,
        })
    }

    pub fn from_sequence<Q: Sequence + ?Sized>(sequence: &Q) -> Result<Self> {
        let length = sequence.length(sequence.version())?;
        Self::new(length, sequence.stride())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of cells (and of markers in the sequence).
    pub fn len(&self) -> usize {
        self.num_rows * self.num_cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.num_rows && col < self.num_cols
    }

    pub fn check(&self, row: usize, col: usize) -> Result<()> {
        if self.contains(row, col) {
            Ok(())
        } else {
            Err(TableError::OutOfRange {
                row,
                col,
                rows: self.num_rows,
                cols: self.num_cols,
            })
        }
    }

    pub fn to_position(&self, row: usize, col: usize) -> Result<usize> {
        self.check(row, col)?;
        Ok(row * self.num_cols + col)
    }

    pub fn to_row_col(&self, position: usize) -> Result<(usize, usize)> {
        if position >= self.len() {
            return Err(TableError::PositionOutOfRange {
                position,
                length: self.len(),
            });
        }
        Ok((position / self.num_cols, position % self.num_cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_shape_from_length_and_stride() {
        let index = GridIndex::new(56, 8).unwrap();
        assert_eq!((index.num_rows(), index.num_cols()), (7, 8));
        assert_eq!(index.len(), 56);
    }

    #[test]
    fn test_empty_sequence_has_no_rows() {
        let index = GridIndex::new(0, 8).unwrap();
        assert_eq!((index.num_rows(), index.num_cols()), (0, 0));
        assert!(index.is_empty());
        let index = GridIndex::new(0, 0).unwrap();
        assert_eq!(index.num_rows(), 0);
    }

    #[test]
    fn test_stride_is_clamped_to_length() {
        let index = GridIndex::new(3, 8).unwrap();
        assert_eq!((index.num_rows(), index.num_cols()), (1, 3));
    }

    #[test]
    fn test_partial_row_is_a_structural_violation() {
        assert!(matches!(
            GridIndex::new(57, 8),
            Err(TableError::StructuralViolation { length: 57, cols: 8 })
        ));
        assert!(matches!(
            GridIndex::new(4, 0),
            Err(TableError::StructuralViolation { .. })
        ));
    }

    #[test]
    fn test_out_of_range_coordinates_fail() {
        let index = GridIndex::new(56, 8).unwrap();
        assert!(matches!(
            index.to_position(7, 0),
            Err(TableError::OutOfRange { row: 7, col: 0, .. })
        ));
        assert!(index.to_position(0, 8).is_err());
        assert!(matches!(
            index.to_row_col(56),
            Err(TableError::PositionOutOfRange { position: 56, .. })
        ));
    }

    #[test]
    fn test_known_positions() {
        let index = GridIndex::new(56, 8).unwrap();
        assert_eq!(index.to_position(0, 0).unwrap(), 0);
        assert_eq!(index.to_position(1, 1).unwrap(), 9);
        assert_eq!(index.to_row_col(25).unwrap(), (3, 1));
    }

    proptest! {
        #[test]
        fn prop_position_round_trips(rows in 1usize..64, cols in 1usize..64, seed in any::<usize>()) {
            let index = GridIndex::new(rows * cols, cols).unwrap();
            let position = seed % index.len();
            let (row, col) = index.to_row_col(position).unwrap();
            prop_assert_eq!(index.to_position(row, col).unwrap(), position);
        }

        #[test]
        fn prop_row_col_round_trips(rows in 1usize..64, cols in 1usize..64, r in any::<usize>(), c in any::<usize>()) {
            let index = GridIndex::new(rows * cols, cols).unwrap();
            let (row, col) = (r % rows, c % cols);
            let position = index.to_position(row, col).unwrap();
            prop_assert_eq!(index.to_row_col(position).unwrap(), (row, col));
        }
    }
}
