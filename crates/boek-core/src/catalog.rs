//! Record lookup and mutation over a loaded book table
//!
//! Records have no primary key. Lookups go through the title column and
//! return positions; any delete shifts later positions down by one, so
//! callers re-resolve after every delete.

use crate::error::{Error, Result};
use crate::normalize::normalize_for_write;
use crate::roles::{resolve_roles, Role, RoleMap};
use crate::storage::{Revision, TableStore};
use crate::table::{normalize_column_name, Record, Table};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Column name to new value
pub type FieldValues = BTreeMap<String, String>;

/// A loaded table together with its roles and the revision it came from
#[derive(Debug, Clone)]
pub struct Catalog {
    table: Table,
    roles: RoleMap,
    revision: Option<Revision>,
    strict_fields: bool,
}

impl Catalog {
    /// Load the table from a store
    pub fn open(store: &dyn TableStore) -> Result<Self> {
        let snapshot = store.load()?;
        let mut catalog = Self::from_table(snapshot.table);
        catalog.revision = Some(snapshot.revision);
        Ok(catalog)
    }

    /// Wrap an in-memory table; saves from it are unchecked
    pub fn from_table(table: Table) -> Self {
        let roles = resolve_roles(&table.column_names());
        Self {
            table,
            roles,
            revision: None,
            strict_fields: false,
        }
    }

    /// Reject unknown field keys with `SchemaMismatch` instead of ignoring them
    pub fn with_strict_fields(mut self, strict: bool) -> Self {
        self.strict_fields = strict;
        self
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn roles(&self) -> &RoleMap {
        &self.roles
    }

    /// Revision this catalog was loaded from or last saved as
    pub fn revision(&self) -> Option<&Revision> {
        self.revision.as_ref()
    }

    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn title_column(&self) -> Option<&str> {
        self.roles.get(Role::Title)
    }

    /// Title of the record at a position
    pub fn title_of(&self, position: usize) -> Option<&str> {
        self.table.cell(position, self.title_column()?)
    }

    /// First position whose title equals `value` exactly (after trimming)
    pub fn find_by_title(&self, value: &str) -> Option<usize> {
        let col = self.table.find_column(self.title_column()?)?.index;
        let wanted = value.trim();
        self.table
            .rows
            .iter()
            .position(|r| r.get(col).map(str::trim) == Some(wanted))
    }

    /// All positions whose title equals `title`, ignoring case.
    ///
    /// This is the advisory check shown while entering a new book and also the
    /// check `insert` enforces, so both always agree.
    pub fn find_duplicates(&self, title: &str) -> Vec<usize> {
        let col = match self.title_column().and_then(|c| self.table.find_column(c)) {
            Some(c) => c.index,
            None => return Vec::new(),
        };
        let wanted = title.trim().to_lowercase();
        self.table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.get(col).is_some_and(|v| v.trim().to_lowercase() == wanted))
            .map(|(i, _)| i)
            .collect()
    }

    /// Overwrite the given fields of the record at `position`.
    ///
    /// Returns the keys that matched no column; those are skipped (or
    /// rejected up front in strict mode).
    pub fn update(&mut self, position: usize, fields: &FieldValues) -> Result<Vec<String>> {
        if position >= self.table.row_count() {
            return Err(Error::PositionOutOfRange {
                position,
                len: self.table.row_count(),
            });
        }

        let (known, unknown) = self.split_fields(fields)?;
        let row = &mut self.table.rows[position];
        for (index, value) in known {
            row.cells[index] = value;
        }
        Ok(unknown)
    }

    /// Remove the record at `position`
    pub fn delete(&mut self, position: usize) -> Result<Record> {
        let record = self.table.remove(position)?;
        info!("Deleted book at position {}", position);
        Ok(record)
    }

    /// Append a new record; missing columns become empty strings.
    ///
    /// Returns the new position and the keys that matched no column.
    /// Fails with `DuplicateTitle` when a book with the same title (ignoring
    /// case) is already present. An empty title skips that check.
    pub fn insert(&mut self, fields: &FieldValues) -> Result<(usize, Vec<String>)> {
        let (known, unknown) = self.split_fields(fields)?;

        // check the title exactly as it will be stored
        let title_index = self
            .title_column()
            .and_then(|c| self.table.find_column(c))
            .map(|c| c.index);
        let title = title_index
            .and_then(|i| known.get(&i))
            .map(|t| t.trim())
            .filter(|t| !t.is_empty());
        if let Some(title) = title {
            let positions = self.find_duplicates(title);
            if !positions.is_empty() {
                return Err(Error::DuplicateTitle {
                    title: title.to_string(),
                    positions,
                });
            }
        }

        let mut cells = vec![String::new(); self.table.column_count()];
        for (index, value) in known {
            cells[index] = value;
        }
        self.table.push_cells(cells);
        Ok((self.table.row_count() - 1, unknown))
    }

    /// Normalize a copy of the table and write it to the store.
    ///
    /// The store rejects the write with `StaleWrite` if it changed since this
    /// catalog was loaded. On any error the in-memory table is untouched.
    pub fn save(&mut self, store: &dyn TableStore) -> Result<Revision> {
        let normalized = normalize_for_write(&self.table, &self.roles);
        let revision = store.replace_all(&normalized, self.revision.as_ref())?;
        self.table = normalized;
        self.revision = Some(revision.clone());
        Ok(revision)
    }

    /// Resolve field keys to column indices.
    ///
    /// Keys that normalize to the same column collapse to one value; the
    /// last key in map order wins, for checks and writes alike.
    fn split_fields(&self, fields: &FieldValues) -> Result<(BTreeMap<usize, String>, Vec<String>)> {
        let mut known = BTreeMap::new();
        let mut unknown = Vec::new();
        for (key, value) in fields {
            match self.table.find_column(&normalize_column_name(key)) {
                Some(col) => {
                    known.insert(col.index, value.clone());
                }
                None => unknown.push(key.clone()),
            }
        }

        if !unknown.is_empty() {
            if self.strict_fields {
                return Err(Error::SchemaMismatch { columns: unknown });
            }
            warn!("Ignoring unknown column(s): {}", unknown.join(", "));
        }

        Ok((known, unknown))
    }
}
