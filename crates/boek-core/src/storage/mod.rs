//! Storage backends for the book table
//!
//! Every backend exposes the same two operations: load the whole table and
//! replace the whole table. There are no partial writes.
//!
//! - [`LocalCsvStore`]: a CSV spreadsheet file on disk
//! - [`RemoteSheetStore`]: a spreadsheet "values" endpoint over HTTP
//! - [`CachedStore`]: a time-boxed memo in front of either
//!
//! Writers can pass the revision they loaded to `replace_all`; the store then
//! refuses the write with [`Error::StaleWrite`](crate::Error::StaleWrite) if
//! someone else wrote in between. Without a base revision the write is
//! unchecked and the last writer silently wins.

use crate::config::{Config, DataSource};
use crate::error::{Error, Result};
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

pub mod cache;
pub mod local;
pub mod remote;

pub use cache::CachedStore;
pub use local::LocalCsvStore;
pub use remote::RemoteSheetStore;

/// Content hash of a table (column names and cell values)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Revision(String);

impl Revision {
    pub fn of_table(table: &Table) -> Self {
        let mut hasher = Sha256::new();
        for column in &table.columns {
            hasher.update(column.name.as_bytes());
            hasher.update([0x1f]);
        }
        for row in &table.rows {
            hasher.update([0x1e]);
            for cell in &row.cells {
                hasher.update(cell.as_bytes());
                hasher.update([0x1f]);
            }
        }
        Revision(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A table as read from a store
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: Table,
    pub revision: Revision,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(table: Table) -> Self {
        let revision = Revision::of_table(&table);
        Self {
            table,
            revision,
            loaded_at: Utc::now(),
        }
    }
}

/// A persistent home for the book table
pub trait TableStore {
    /// Read the whole table
    fn load(&self) -> Result<Snapshot>;

    /// Replace the whole persisted table.
    ///
    /// With `base` set, fails with `StaleWrite` if the store no longer holds
    /// that revision. Returns the revision of what was written.
    fn replace_all(&self, table: &Table, base: Option<&Revision>) -> Result<Revision>;

    /// Human-readable location, for messages
    fn describe(&self) -> String;
}

impl<S: TableStore + ?Sized> TableStore for Box<S> {
    fn load(&self) -> Result<Snapshot> {
        (**self).load()
    }

    fn replace_all(&self, table: &Table, base: Option<&Revision>) -> Result<Revision> {
        (**self).replace_all(table, base)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Compare the store's current revision against the writer's base
pub(crate) fn check_base(current: &Revision, base: Option<&Revision>) -> Result<()> {
    match base {
        Some(expected) if expected != current => Err(Error::StaleWrite {
            expected: expected.to_string(),
            found: current.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Build the store selected by the configuration, wrapped in a cache
pub fn open_store(config: &Config) -> Result<Box<dyn TableStore>> {
    let inner: Box<dyn TableStore> = match config.data_source {
        DataSource::Local => Box::new(LocalCsvStore::new(&config.data_path)),
        DataSource::Remote => {
            if config.remote_url.trim().is_empty() {
                return Err(Error::Config {
                    path: config.source_path.clone(),
                    message: "data_source is 'remote' but remote_url is empty".to_string(),
                });
            }
            let token = std::env::var(&config.remote_token_env).ok();
            if token.is_none() {
                tracing::warn!(
                    "{} is not set, remote requests are sent without credentials",
                    config.remote_token_env
                );
            }
            Box::new(RemoteSheetStore::new(
                config.remote_url.trim(),
                token,
                Duration::from_secs(config.remote_timeout_secs),
            )?)
        }
    };

    Ok(Box::new(CachedStore::new(
        inner,
        Duration::from_secs(config.cache_ttl_secs),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        let mut t = Table::with_columns(["titel", "auteur"]);
        for r in rows {
            t.push_cells(r.iter().map(|s| s.to_string()).collect());
        }
        t
    }

    #[test]
    fn test_revision_tracks_content() {
        let a = table(&[&["Dune", "Herbert"]]);
        let b = table(&[&["Dune", "Herbert"]]);
        let c = table(&[&["Dune", "herbert"]]);

        assert_eq!(Revision::of_table(&a), Revision::of_table(&b));
        assert_ne!(Revision::of_table(&a), Revision::of_table(&c));
        assert_eq!(Revision::of_table(&a).as_str().len(), 64);
    }

    #[test]
    fn test_revision_separates_cells() {
        let a = table(&[&["ab", "c"]]);
        let b = table(&[&["a", "bc"]]);
        assert_ne!(Revision::of_table(&a), Revision::of_table(&b));
    }

    #[test]
    fn test_check_base() {
        let current = Revision::of_table(&table(&[]));
        let other = Revision::of_table(&table(&[&["x", "y"]]));

        assert!(check_base(&current, None).is_ok());
        assert!(check_base(&current, Some(&current)).is_ok());
        assert!(matches!(
            check_base(&current, Some(&other)),
            Err(Error::StaleWrite { .. })
        ));
    }

    #[test]
    fn test_open_store_rejects_empty_remote_url() {
        let config = Config {
            data_source: DataSource::Remote,
            remote_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(open_store(&config), Err(Error::Config { .. })));
    }
}
