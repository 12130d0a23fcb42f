//! boek-core: Core library for a spreadsheet-backed book catalog
//!
//! This library provides functionality to:
//! - Load the book list from a local CSV file or a remote spreadsheet
//! - Infer which column holds the title, author, language, location and category
//! - Look up, update, delete and insert books, guarding against duplicate titles
//! - Normalize text and write the whole list back, refusing stale writes
//! - Search, filter and summarize the list, and export selections to PDF

pub mod catalog;
pub mod config;
pub mod edits;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod pdf;
pub mod query;
pub mod roles;
pub mod storage;
pub mod table;

pub use catalog::{Catalog, FieldValues};
pub use config::{Config, DataSource};
pub use edits::{apply_edits, Edit, EditFile, EditResult};
pub use error::{Error, Result};
pub use normalize::normalize_for_write;
pub use parser::{parse_csv, parse_csv_str};
pub use pdf::{render_catalog, render_table};
pub use query::{distinct_values, search, CatalogStats, Filter};
pub use roles::{resolve_roles, Role, RoleMap};
pub use storage::{open_store, Revision, Snapshot, TableStore};
pub use table::{Column, Record, RecordId, Table};
