//! Document configuration loaded from TOML.
//!
//! ```toml
//! rows = 7
//! cols = 8
//! max_operations = 100000
//! ```

use std::path::Path;

use serde::Deserialize;
use tabledoc_engine::engine::DEFAULT_MAX_OPERATIONS;

use crate::error::{Result, TableError};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Rows of a freshly created document.
    pub rows: usize,
    /// Columns (stride) of a freshly created document.
    pub cols: usize,
    /// Operation budget for one formula evaluation before it reports paused.
    pub max_operations: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            rows: 7,
            cols: 8,
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

impl TableConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TableConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cols == 0 {
            return Err(TableError::Config("cols must be at least 1".into()));
        }
        if self.rows == 0 {
            return Err(TableError::Config("rows must be at least 1".into()));
        }
        if self.max_operations == 0 {
            return Err(TableError::Config("max_operations must be at least 1".into()));
        }
        self.cell_count()?;
        Ok(())
    }

    /// Number of cells in a freshly created document.
    pub fn cell_count(&self) -> Result<usize> {
        self.rows.checked_mul(self.cols).ok_or_else(|| {
            TableError::Config(format!(
                "{} rows of {} columns is more cells than can be addressed",
                self.rows, self.cols
            ))
        })
    }
}
