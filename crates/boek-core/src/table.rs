//! Core table types for representing the book list

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Synthetic identifier of a record, stable for the lifetime of a loaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// An ordered sequence of records sharing one set of columns
#[derive(Debug, Clone, Default, Serialize)]
pub struct Table {
    /// Column definitions, names normalized
    pub columns: Vec<Column>,
    /// Records in table order
    pub rows: Vec<Record>,
    #[serde(skip)]
    next_id: u64,
}

impl Table {
    /// Build a table from raw headers and rows.
    ///
    /// Header names are trimmed and lowercased. Headers that are blank or start
    /// with `Unnamed` are dropped along with their cells. Rows are padded with
    /// empty strings or truncated to the header width.
    pub fn from_raw(origin: &str, headers: &[String], raw_rows: Vec<Vec<String>>) -> Result<Self> {
        let kept: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| !is_unnamed(name))
            .map(|(i, _)| i)
            .collect();

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(kept.len());
        for (index, &raw_idx) in kept.iter().enumerate() {
            let name = normalize_column_name(&headers[raw_idx]);
            if !seen.insert(name.clone()) {
                return Err(Error::load(origin, format!("duplicate column '{}'", name)));
            }
            columns.push(Column::new(name, index));
        }

        if columns.is_empty() {
            return Err(Error::load(origin, "no columns found"));
        }

        let mut table = Table {
            columns,
            rows: Vec::with_capacity(raw_rows.len()),
            next_id: 0,
        };

        for (row_idx, mut raw) in raw_rows.into_iter().enumerate() {
            if raw.len() > headers.len() {
                tracing::warn!(
                    "row {} in {} has more cells than columns, truncating",
                    row_idx + 1,
                    origin
                );
            }
            raw.resize(headers.len(), String::new());
            let cells = kept.iter().map(|&i| std::mem::take(&mut raw[i])).collect();
            table.push_cells(cells);
        }

        Ok(table)
    }

    /// Create an empty table with the given (already normalized) column names
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| Column::new(n.into(), i))
            .collect();
        Self {
            columns,
            rows: Vec::new(),
            next_id: 0,
        }
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get the record at a position
    pub fn get(&self, position: usize) -> Option<&Record> {
        self.rows.get(position)
    }

    /// Get a single cell by position and column name
    pub fn cell(&self, position: usize, column: &str) -> Option<&str> {
        let col = self.find_column(column)?;
        self.rows.get(position)?.get(col.index)
    }

    /// Current position of a record id, if it is still in the table
    pub fn position_of(&self, id: RecordId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Append a record, assigning it a fresh id. Cells must match the column count.
    pub fn push_cells(&mut self, mut cells: Vec<String>) -> RecordId {
        cells.resize(self.columns.len(), String::new());
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.rows.push(Record::new(id, cells));
        id
    }

    /// Remove the record at a position; later records shift down by one
    pub fn remove(&mut self, position: usize) -> Result<Record> {
        if position >= self.rows.len() {
            return Err(Error::PositionOutOfRange {
                position,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(position))
    }

    /// Copy of the records at the given positions, in the given order
    pub fn select(&self, positions: &[usize]) -> Table {
        let mut subset = Table {
            columns: self.columns.clone(),
            rows: Vec::with_capacity(positions.len()),
            next_id: self.next_id,
        };
        subset
            .rows
            .extend(positions.iter().filter_map(|&p| self.rows.get(p)).cloned());
        subset
    }

    /// Cell values as plain rows, for writers and renderers
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|r| r.cells.clone()).collect()
    }
}

/// Field-for-field equality: column names and cell values, ignoring record ids
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.column_names() == other.column_names()
            && self.rows.len() == other.rows.len()
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(a, b)| a.cells == b.cells)
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Normalized column name (e.g., "titel")
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A single book record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Cell values for each column
    pub cells: Vec<String>,
}

impl Record {
    /// Create a new record
    pub fn new(id: RecordId, cells: Vec<String>) -> Self {
        Self { id, cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// Trim and lowercase a column name
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn is_unnamed(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed.starts_with("Unnamed")
}
