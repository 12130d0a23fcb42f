//! Error types for boek-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in boek-core
#[derive(Debug, Error)]
pub enum Error {
    /// The backend is unreachable or its content is malformed
    #[error("failed to load table from {origin}: {message}")]
    Load { origin: String, message: String },

    /// A record with the same title (case-insensitive) already exists
    #[error("a book titled '{title}' already exists at position(s) {positions:?}")]
    DuplicateTitle { title: String, positions: Vec<usize> },

    /// The store changed since the table was loaded
    #[error("stale write: table was loaded at revision {expected} but store is at {found}")]
    StaleWrite { expected: String, found: String },

    /// Field keys that match no column (strict mode only)
    #[error("unknown column(s): {}", columns.join(", "))]
    SchemaMismatch { columns: Vec<String> },

    /// Position outside the table
    #[error("position {position} is out of range (table has {len} rows)")]
    PositionOutOfRange { position: usize, len: usize },

    /// No record with this title
    #[error("no book titled '{0}'")]
    TitleNotFound(String),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The remote sheet answered with an error status or an unusable body
    #[error("remote sheet '{url}': {message}")]
    Remote { url: String, message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid settings
    #[error("invalid configuration in '{path}': {message}")]
    Config { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn load(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Load {
            origin: origin.into(),
            message: message.into(),
        }
    }
}
