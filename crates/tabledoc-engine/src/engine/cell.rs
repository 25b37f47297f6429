//! Cell data structures held by the workbook.
//!
//! - [`CellType`] - The kind of content in a cell (empty, text, number, or formula)
//! - [`Cell`] - Raw cell text plus its parsed form and dependencies
//! - [`Grid`] - Thread-safe sparse storage for cells (backed by `DashMap`)
//! - [`ValueCache`] - Evaluated formula results shared with the builtins

use dashmap::DashMap;
use std::sync::Arc;

use super::cell_ref::CellRef;
use super::deps::extract_dependencies;

/// The type of content stored in a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellType {
    Empty,
    Text(String),
    Number(f64),
    /// Formula body without the leading `=`.
    Formula(String),
}

/// A cell as the workbook sees it.
#[derive(Clone, Debug)]
pub struct Cell {
    /// Text exactly as it was loaded or written.
    pub text: String,
    pub contents: CellType,
    pub depends_on: Vec<CellRef>,
}

impl Cell {
    /// Parse cell text.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' -> Formula (without the '=')
    /// - Quoted string -> Text (without quotes)
    /// - Valid number -> Number
    /// - Otherwise -> Text
    pub fn from_text(text: &str) -> Cell {
        let trimmed = text.trim();
        let contents = if trimmed.is_empty() {
            CellType::Empty
        } else if let Some(formula) = trimmed.strip_prefix('=') {
            CellType::Formula(formula.to_string())
        } else if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
            CellType::Text(trimmed[1..trimmed.len() - 1].to_string())
        } else if let Ok(n) = trimmed.parse::<f64>() {
            CellType::Number(n)
        } else {
            CellType::Text(trimmed.to_string())
        };

        let depends_on = match &contents {
            CellType::Formula(f) => extract_dependencies(f),
            _ => Vec::new(),
        };

        Cell {
            text: text.to_string(),
            contents,
            depends_on,
        }
    }
}

/// Thread-safe sparse grid storage.
pub type Grid = Arc<DashMap<CellRef, Cell>>;

/// Evaluated formula results, keyed by cell. Builtins consult this before
/// re-evaluating a referenced formula.
pub type ValueCache = Arc<DashMap<CellRef, rhai::Dynamic>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_classifies_contents() {
        assert_eq!(Cell::from_text("").contents, CellType::Empty);
        assert_eq!(Cell::from_text("   ").contents, CellType::Empty);
        assert_eq!(Cell::from_text("5").contents, CellType::Number(5.0));
        assert_eq!(Cell::from_text("hello").contents, CellType::Text("hello".into()));
        assert_eq!(Cell::from_text("\"42\"").contents, CellType::Text("42".into()));
        assert_eq!(
            Cell::from_text("=A1*2").contents,
            CellType::Formula("A1*2".into())
        );
    }

    #[test]
    fn test_from_text_keeps_raw_text() {
        let cell = Cell::from_text(" 5.0 ");
        assert_eq!(cell.text, " 5.0 ");
    }

    #[test]
    fn test_formula_dependencies_are_extracted() {
        let cell = Cell::from_text("=A1 + B2");
        assert_eq!(cell.depends_on, vec![CellRef::new(0, 0), CellRef::new(1, 1)]);
    }
}
