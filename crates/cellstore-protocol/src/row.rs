//! Rows and cells produced by read operations.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single cell within a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Column family name.
    pub family_name: String,
    /// Column qualifier within the family.
    pub column_qualifier: Bytes,
    /// Cell timestamp in microseconds since the epoch.
    pub timestamp_micros: i64,
    /// Cell value.
    pub value: Bytes,
}

/// A row returned by a read: a key plus its cells in server order.
///
/// Rows are immutable once yielded by a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    row_key: String,
    cells: Vec<Cell>,
}

impl Row {
    /// Create a row from its key and cells.
    pub fn new(row_key: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            row_key: row_key.into(),
            cells,
        }
    }

    /// The row key.
    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    /// The cells of the row, in the order the server produced them.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Decompose into key and cells.
    pub fn into_parts(self) -> (String, Vec<Cell>) {
        (self.row_key, self.cells)
    }
}
