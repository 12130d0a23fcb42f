//! Settings file (`settings.json`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the book list lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Local,
    Remote,
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(DataSource::Local),
            "remote" => Ok(DataSource::Remote),
            other => Err(format!("unknown data source '{}', expected local or remote", other)),
        }
    }
}

/// Application settings. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_source: DataSource,
    /// CSV file used when `data_source` is local
    pub data_path: PathBuf,
    /// Values endpoint used when `data_source` is remote
    pub remote_url: String,
    /// Environment variable holding the bearer token for the remote sheet
    pub remote_token_env: String,
    pub remote_timeout_secs: u64,
    /// How long a loaded table is reused; 0 disables the cache
    pub cache_ttl_secs: u64,
    /// Reject edits naming unknown columns instead of ignoring them
    pub strict_fields: bool,
    /// File this config was read from
    #[serde(skip)]
    pub source_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_source: DataSource::Local,
            data_path: PathBuf::from("Boeken_Map.csv"),
            remote_url: String::new(),
            remote_token_env: "BOEK_REMOTE_TOKEN".to_string(),
            remote_timeout_secs: 10,
            cache_ttl_secs: 60,
            strict_fields: false,
            source_path: PathBuf::from("settings.json"),
        }
    }
}

impl Config {
    /// Load settings, or defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            let mut config = Self::default();
            config.attach(path);
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Config = serde_json::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.attach(path);
        Ok(config)
    }

    /// Record where the settings live; a relative data path is taken
    /// relative to the settings file
    fn attach(&mut self, path: &Path) {
        self.source_path = path.to_path_buf();
        if self.data_path.is_relative() {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                self.data_path = dir.join(&self.data_path);
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
