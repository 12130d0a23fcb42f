//! Local CSV file backend
//!
//! Writes go to a temporary file next to the target which is then renamed
//! over it, so a reader never observes a half-written list.

use super::{check_base, Revision, Snapshot, TableStore};
use crate::error::{Error, Result};
use crate::parser::{parse_csv, write_csv};
use crate::table::Table;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Book list stored as a CSV file
#[derive(Debug, Clone)]
pub struct LocalCsvStore {
    path: PathBuf,
}

impl LocalCsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, table: &Table) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            write_csv(table, &mut writer, &self.path)?;
            writer.flush()?;
        }
        // keep the permissions of the file being replaced
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl TableStore for LocalCsvStore {
    fn load(&self) -> Result<Snapshot> {
        let table = parse_csv(&self.path).map_err(|e| match e {
            Error::FileRead { path, source } => {
                Error::load(path.display().to_string(), source.to_string())
            }
            Error::Csv { path, source } => Error::load(path.display().to_string(), source.to_string()),
            other => other,
        })?;
        let snapshot = Snapshot::new(table);
        info!(
            "Loaded {} books from {} (revision {})",
            snapshot.table.row_count(),
            self.path.display(),
            snapshot.revision.short()
        );
        Ok(snapshot)
    }

    fn replace_all(&self, table: &Table, base: Option<&Revision>) -> Result<Revision> {
        if let Some(expected) = base {
            if !self.path.exists() {
                return Err(Error::StaleWrite {
                    expected: expected.to_string(),
                    found: "(file removed)".to_string(),
                });
            }
            let current = Revision::of_table(&parse_csv(&self.path)?);
            check_base(&current, base)?;
        }

        self.write_atomically(table)?;

        let revision = Revision::of_table(table);
        info!(
            "Saved {} books to {} (revision {})",
            table.row_count(),
            self.path.display(),
            revision.short()
        );
        Ok(revision)
    }

    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("boeken.csv");
        fs::write(&path, "Titel,Auteur,Taal\nDune,Herbert,engels\nEmma,Austen,engels\n").unwrap();
        path
    }

    #[test]
    fn test_load_missing_file_is_load_failure() {
        let dir = TempDir::new().unwrap();
        let store = LocalCsvStore::new(dir.path().join("missing.csv"));
        assert!(matches!(store.load(), Err(Error::Load { .. })));
    }

    #[test]
    fn test_replace_all_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocalCsvStore::new(write_sample(&dir));

        let mut snapshot = store.load().unwrap();
        snapshot.table.remove(0).unwrap();
        let revision = store.replace_all(&snapshot.table, Some(&snapshot.revision)).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.table, snapshot.table);
        assert_eq!(reloaded.revision, revision);
    }

    #[test]
    fn test_replace_all_creates_new_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalCsvStore::new(dir.path().join("nieuw.csv"));

        let mut table = Table::with_columns(["titel"]);
        table.push_cells(vec!["Dune".to_string()]);
        store.replace_all(&table, None).unwrap();

        assert_eq!(store.load().unwrap().table, table);
    }

    #[test]
    fn test_stale_write_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let first = LocalCsvStore::new(&path);
        let second = LocalCsvStore::new(&path);

        let a = first.load().unwrap();
        let mut b = second.load().unwrap();

        let mut changed = a.table.clone();
        changed.remove(1).unwrap();
        first.replace_all(&changed, Some(&a.revision)).unwrap();

        b.table.remove(0).unwrap();
        let err = second.replace_all(&b.table, Some(&b.revision)).unwrap_err();
        assert!(matches!(err, Error::StaleWrite { .. }));

        // first writer's change is what the store holds
        assert_eq!(first.load().unwrap().table, changed);
    }

    #[test]
    fn test_unchecked_writes_lose_updates() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let store = LocalCsvStore::new(&path);

        let mut a = store.load().unwrap().table;
        let mut b = store.load().unwrap().table;

        a.remove(0).unwrap();
        b.remove(1).unwrap();
        store.replace_all(&a, None).unwrap();
        store.replace_all(&b, None).unwrap();

        // last writer wins; the first writer's delete is gone
        assert_eq!(store.load().unwrap().table, b);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = LocalCsvStore::new(write_sample(&dir));
        let snapshot = store.load().unwrap();
        store.replace_all(&snapshot.table, None).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_checked_write_to_removed_file_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let store = LocalCsvStore::new(&path);
        let snapshot = store.load().unwrap();

        fs::remove_file(&path).unwrap();
        let err = store.replace_all(&snapshot.table, Some(&snapshot.revision)).unwrap_err();

        assert!(matches!(err, Error::StaleWrite { .. }));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_all_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        let store = LocalCsvStore::new(&path);

        let snapshot = store.load().unwrap();
        store.replace_all(&snapshot.table, Some(&snapshot.revision)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
