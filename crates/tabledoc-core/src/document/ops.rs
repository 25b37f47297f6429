use tabledoc_engine::CellOrigin;
use tracing::debug;

use super::Document;
use super::bridge::EvalBridge;
use crate::error::{Result, TableError};
use crate::grid::{self, CellRange, GridIndex, cell_text};
use crate::sequence::{Marker, Sequence};

/// Dimension for row/column operations
#[derive(Copy, Clone, Debug)]
enum Dimension {
    Row,
    Column,
}

impl<Q: Sequence> Document<Q> {
    /// Text stored in the cell's marker.
    pub fn get_cell_text(&self, row: usize, col: usize) -> Result<String> {
        cell_text(&self.sequence, row, col)
    }

    /// Replace the text of one cell. Fails without touching the sequence if
    /// `(row, col)` is outside the grid.
    pub fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        self.shape()?.check(row, col)?;
        debug!(row, col, text, "set cell");

        let mut bridge = EvalBridge::new(&mut self.sequence, self.actor, self.mode);
        self.workbook
            .set_cell_text(row, col, text, CellOrigin::Local, &mut bridge)
    }

    /// Name the rectangle `(min_row, min_col)..=(max_row, max_col)`.
    /// An existing range with the same label is replaced. Ranges are shared
    /// with every session on the sequence.
    pub fn create_range(
        &mut self,
        label: &str,
        min_row: usize,
        min_col: usize,
        max_row: usize,
        max_col: usize,
    ) -> Result<()> {
        let range = CellRange::new(min_row, min_col, max_row, max_col);
        grid::create_range(&mut self.sequence, self.actor, label, range)
    }

    /// Current bounds of a named range.
    pub fn get_range(&self, label: &str) -> Result<CellRange> {
        grid::resolve_range(&self.sequence, label)
    }

    pub fn remove_range(&mut self, label: &str) -> Result<()> {
        grid::remove_range(&mut self.sequence, self.actor, label)
    }

    /// Labels of every named range, sorted.
    pub fn range_labels(&self) -> Vec<String> {
        grid::range_labels(&self.sequence)
    }

    /// Insert `count` empty rows before row `at` (`at == num_rows` appends).
    pub fn insert_rows(&mut self, at: usize, count: usize) -> Result<()> {
        self.insert_dimension(Dimension::Row, at, count)
    }

    /// Remove rows `at..at + count`.
    pub fn remove_rows(&mut self, at: usize, count: usize) -> Result<()> {
        self.remove_dimension(Dimension::Row, at, count)
    }

    /// Insert `count` empty columns before column `at`.
    pub fn insert_cols(&mut self, at: usize, count: usize) -> Result<()> {
        self.insert_dimension(Dimension::Column, at, count)
    }

    /// Remove columns `at..at + count`.
    pub fn remove_cols(&mut self, at: usize, count: usize) -> Result<()> {
        self.remove_dimension(Dimension::Column, at, count)
    }

    fn dimension_error(shape: GridIndex, dim: Dimension, at: usize) -> TableError {
        let (row, col) = match dim {
            Dimension::Row => (at, 0),
            Dimension::Column => (0, at),
        };
        TableError::OutOfRange {
            row,
            col,
            rows: shape.num_rows(),
            cols: shape.num_cols(),
        }
    }

    fn insert_dimension(&mut self, dim: Dimension, at: usize, count: usize) -> Result<()> {
        let shape = self.shape()?;
        // A grid emptied of rows keeps its stride as the width of new rows.
        let cols = if shape.is_empty() {
            self.sequence.stride()
        } else {
            shape.num_cols()
        };
        let rows = shape.num_rows();
        let limit = match dim {
            Dimension::Row => rows,
            Dimension::Column => cols,
        };
        if at > limit {
            return Err(Self::dimension_error(shape, dim, at));
        }
        if count == 0 {
            return Ok(());
        }

        let actor = self.actor;
        match dim {
            Dimension::Row => {
                if cols == 0 {
                    return Err(TableError::StructuralViolation { length: 0, cols });
                }
                for _ in 0..count * cols {
                    self.sequence.insert_at(at * cols, Marker::default(), actor)?;
                }
            }
            Dimension::Column => {
                // Bottom row first so earlier row offsets stay valid.
                for row in (0..rows).rev() {
                    for _ in 0..count {
                        self.sequence
                            .insert_at(row * cols + at, Marker::default(), actor)?;
                    }
                }
                self.sequence.set_stride(cols + count, actor)?;
            }
        }

        debug!(?dim, at, count, "inserted");
        self.refresh_all()?;
        Ok(())
    }

    fn remove_dimension(&mut self, dim: Dimension, at: usize, count: usize) -> Result<()> {
        let shape = self.shape()?;
        let (rows, cols) = (shape.num_rows(), shape.num_cols());
        let limit = match dim {
            Dimension::Row => rows,
            Dimension::Column => cols,
        };
        let end = at.checked_add(count).filter(|end| *end <= limit);
        if at >= limit || end.is_none() {
            return Err(Self::dimension_error(shape, dim, at));
        }
        if count == 0 {
            return Ok(());
        }

        let actor = self.actor;
        match dim {
            Dimension::Row => {
                self.sequence.delete_range(at * cols, (at + count) * cols, actor)?;
            }
            Dimension::Column => {
                for row in (0..rows).rev() {
                    let start = row * cols + at;
                    self.sequence.delete_range(start, start + count, actor)?;
                }
                self.sequence.set_stride(cols - count, actor)?;
            }
        }

        debug!(?dim, at, count, "removed");
        self.refresh_all()?;
        Ok(())
    }
}
