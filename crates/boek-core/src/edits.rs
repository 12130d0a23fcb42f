//! Edit files: batches of changes to the book list
//!
//! An edit file is JSON:
//!
//! ```json
//! { "edits": [
//!     { "op": "update", "title": "Dune", "fields": { "locatie": "kast 2" } },
//!     { "op": "delete", "title": "Emma" },
//!     { "op": "insert", "fields": { "titel": "Persuasion", "auteur": "Austen" } }
//! ] }
//! ```
//!
//! Titles are resolved again for every edit, so a delete never leaves a stale
//! position behind for the edits that follow it.

use crate::catalog::{Catalog, FieldValues};
use crate::error::{Error, Result};
use crate::table::normalize_column_name;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A single change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Edit {
    Update { title: String, fields: FieldValues },
    Delete { title: String },
    Insert { fields: FieldValues },
}

impl Edit {
    /// Short description for reports. Inserts are labelled with the value
    /// for the catalog's title column.
    pub fn describe(&self, catalog: &Catalog) -> String {
        match self {
            Edit::Update { title, .. } => format!("update '{}'", title),
            Edit::Delete { title } => format!("delete '{}'", title),
            Edit::Insert { fields } => {
                let title = catalog
                    .title_column()
                    .and_then(|col| {
                        fields
                            .iter()
                            .rev()
                            .find(|(k, _)| normalize_column_name(k) == col)
                    })
                    .map(|(_, v)| v.trim())
                    .unwrap_or("");
                format!("insert '{}'", title)
            }
        }
    }
}

/// A file containing a list of edits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditFile {
    pub edits: Vec<Edit>,
}

impl EditFile {
    /// Create a new empty edit file
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Load an edit file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the edit file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Outcome of applying an edit file
#[derive(Debug, Clone, Default)]
pub struct EditResult {
    /// Number of edits applied
    pub applied: usize,
    /// Edits that could not be applied, with the reason
    pub failed: Vec<(Edit, String)>,
    /// Field keys that matched no column and were skipped
    pub ignored_fields: Vec<String>,
}

impl EditResult {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Apply edits in order to the catalog. Failing edits are collected, not fatal.
pub fn apply_edits(catalog: &mut Catalog, file: &EditFile) -> EditResult {
    let mut result = EditResult::default();

    for edit in &file.edits {
        match apply_one(catalog, edit) {
            Ok(ignored) => {
                result.applied += 1;
                result.ignored_fields.extend(ignored);
            }
            Err(e) => result.failed.push((edit.clone(), e.to_string())),
        }
    }

    result
}

fn apply_one(catalog: &mut Catalog, edit: &Edit) -> Result<Vec<String>> {
    match edit {
        Edit::Update { title, fields } => {
            let position = locate(catalog, title)?;
            catalog.update(position, fields)
        }
        Edit::Delete { title } => {
            let position = locate(catalog, title)?;
            catalog.delete(position)?;
            Ok(Vec::new())
        }
        Edit::Insert { fields } => {
            let (_, ignored) = catalog.insert(fields)?;
            Ok(ignored)
        }
    }
}

fn locate(catalog: &Catalog, title: &str) -> Result<usize> {
    catalog
        .find_by_title(title)
        .ok_or_else(|| Error::TitleNotFound(title.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn fields(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn catalog() -> Catalog {
        let mut table = Table::with_columns(["titel", "auteur", "locatie"]);
        for (t, a, l) in [("Dune", "Herbert", "kast"), ("Emma", "Austen", "zolder"), ("Ilias", "Homerus", "kast")] {
            table.push_cells(vec![t.to_string(), a.to_string(), l.to_string()]);
        }
        Catalog::from_table(table)
    }

    #[test]
    fn test_edit_file_serialization() {
        let mut file = EditFile::new();
        file.add_edit(Edit::Delete {
            title: "Emma".to_string(),
        });
        file.add_edit(Edit::Insert {
            fields: fields(&[("titel", "Persuasion")]),
        });

        let json = serde_json::to_string_pretty(&file).unwrap();
        assert!(json.contains("\"op\": \"delete\""));

        let loaded: EditFile = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.edits, file.edits);
    }

    #[test]
    fn test_delete_then_update_later_record() {
        let mut catalog = catalog();
        let mut file = EditFile::new();
        file.add_edit(Edit::Delete {
            title: "Dune".to_string(),
        });
        file.add_edit(Edit::Update {
            title: "Ilias".to_string(),
            fields: fields(&[("locatie", "zolder")]),
        });

        let result = apply_edits(&mut catalog, &file);

        assert!(result.is_clean());
        assert_eq!(result.applied, 2);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.table().cell(1, "titel"), Some("Ilias"));
        assert_eq!(catalog.table().cell(1, "locatie"), Some("zolder"));
        assert_eq!(catalog.table().cell(0, "locatie"), Some("zolder"));
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let mut catalog = catalog();
        let mut file = EditFile::new();
        file.add_edit(Edit::Delete {
            title: "Onbekend".to_string(),
        });
        file.add_edit(Edit::Insert {
            fields: fields(&[("titel", "emma")]),
        });
        file.add_edit(Edit::Update {
            title: "Dune".to_string(),
            fields: fields(&[("auteur", "Frank Herbert"), ("isbn", "9780441013593")]),
        });

        let result = apply_edits(&mut catalog, &file);

        assert_eq!(result.applied, 1);
        assert_eq!(result.failed.len(), 2);
        assert!(result.failed[0].1.contains("Onbekend"));
        assert!(result.failed[1].1.contains("already exists"));
        assert_eq!(result.ignored_fields, vec!["isbn".to_string()]);
        assert_eq!(catalog.table().cell(0, "auteur"), Some("Frank Herbert"));
    }

    #[test]
    fn test_insert_reports_ignored_fields() {
        let mut catalog = catalog();
        let mut file = EditFile::new();
        file.add_edit(Edit::Insert {
            fields: fields(&[("titel", "Persuasion"), ("isbn", "9780141439686")]),
        });

        let result = apply_edits(&mut catalog, &file);

        assert!(result.is_clean());
        assert_eq!(result.ignored_fields, vec!["isbn".to_string()]);
        assert_eq!(catalog.table().cell(3, "titel"), Some("Persuasion"));
    }

    #[test]
    fn test_describe_uses_title_column() {
        let mut table = Table::with_columns(["titel", "ondertitel"]);
        table.push_cells(vec!["Dune".to_string(), String::new()]);
        let catalog = Catalog::from_table(table);

        let edit = Edit::Insert {
            fields: fields(&[("ondertitel", "Deel 1"), ("Titel", "Dune Messiah")]),
        };
        assert_eq!(edit.describe(&catalog), "insert 'Dune Messiah'");
        assert_eq!(
            Edit::Delete { title: "Dune".to_string() }.describe(&catalog),
            "delete 'Dune'"
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = EditFile::load("/nonexistent/edits.json").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
