//! Remote spreadsheet backend
//!
//! Talks to a spreadsheet "values" resource: `GET` returns the sheet as a
//! JSON grid (first row is the header), `PUT` overwrites the cells it covers.
//! A full replace therefore reads the sheet first and pads the new grid with
//! blank cells over everything the sheet held before, so deleted rows do not
//! linger below the table. Reads get one retry after a timeout or connection
//! failure; writes are never retried.

use super::{check_base, Revision, Snapshot, TableStore};
use crate::error::{Error, Result};
use crate::table::Table;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Wire format of the values resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Book list stored in a remote spreadsheet
pub struct RemoteSheetStore {
    url: String,
    auth_token: Option<String>,
    client: Client,
}

impl RemoteSheetStore {
    pub fn new(url: impl Into<String>, auth_token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            auth_token,
            client,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn fetch_once(&self) -> std::result::Result<reqwest::blocking::Response, reqwest::Error> {
        self.authorized(self.client.get(&self.url)).send()
    }

    fn fetch(&self) -> Result<ValueRange> {
        let response = match self.fetch_once() {
            Ok(r) => r,
            Err(e) if e.is_timeout() || e.is_connect() => {
                warn!("Fetching {} failed ({}), retrying once", self.url, e);
                self.fetch_once()
                    .map_err(|e| Error::load(&self.url, e.to_string()))?
            }
            Err(e) => return Err(Error::load(&self.url, e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::load(&self.url, format!("HTTP {}", status)));
        }

        response
            .json::<ValueRange>()
            .map_err(|e| Error::load(&self.url, format!("invalid values payload: {}", e)))
    }
}

impl TableStore for RemoteSheetStore {
    fn load(&self) -> Result<Snapshot> {
        let range = self.fetch()?;
        let table = values_to_table(&self.url, range.values)?;
        let snapshot = Snapshot::new(table);
        info!(
            "Loaded {} books from {} (revision {})",
            snapshot.table.row_count(),
            self.url,
            snapshot.revision.short()
        );
        Ok(snapshot)
    }

    fn replace_all(&self, table: &Table, base: Option<&Revision>) -> Result<Revision> {
        let current = self.fetch()?.values;
        let height = current.len();
        let width = current.iter().map(Vec::len).max().unwrap_or(0);
        if base.is_some() {
            let current = values_to_table(&self.url, current)?;
            check_base(&Revision::of_table(&current), base)?;
        }

        let mut body = table_to_values(table);
        // revision of the grid as the next load will read it back
        let revision = Revision::of_table(&values_to_table(&self.url, body.values.clone())?);
        pad_grid(&mut body.values, height, width);
        let response = self
            .authorized(self.client.put(&self.url))
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(Error::Remote {
                url: self.url.clone(),
                message: format!("HTTP {}: {}", status, text.trim()),
            });
        }

        info!(
            "Saved {} books to {} (revision {})",
            table.row_count(),
            self.url,
            revision.short()
        );
        Ok(revision)
    }

    fn describe(&self) -> String {
        format!("remote sheet {}", self.url)
    }
}

/// Convert a JSON grid (header row first) into a table.
/// Blank rows at the bottom of the sheet are dropped.
pub fn values_to_table(origin: &str, values: Vec<Vec<Value>>) -> Result<Table> {
    let mut grid: Vec<Vec<String>> = values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect();
    while grid
        .last()
        .is_some_and(|row| row.iter().all(|c| c.trim().is_empty()))
    {
        grid.pop();
    }
    if grid.is_empty() {
        return Err(Error::load(origin, "sheet is empty, expected a header row"));
    }
    let headers = grid.remove(0);
    Table::from_raw(origin, &headers, grid)
}

/// Convert a table into a JSON grid for a full overwrite
pub fn table_to_values(table: &Table) -> ValueRange {
    let mut values = Vec::with_capacity(table.row_count() + 1);
    values.push(
        table
            .columns
            .iter()
            .map(|c| Value::String(c.name.clone()))
            .collect(),
    );
    values.extend(
        table
            .rows
            .iter()
            .map(|r| r.cells.iter().cloned().map(Value::String).collect()),
    );
    ValueRange {
        range: None,
        major_dimension: Some("ROWS".to_string()),
        values,
    }
}

/// Extend every row to `width` and the grid to `height` rows with blanks
fn pad_grid(values: &mut Vec<Vec<Value>>, height: usize, width: usize) {
    let width = values.iter().map(Vec::len).max().unwrap_or(0).max(width);
    let blank = Value::String(String::new());
    for row in values.iter_mut() {
        row.resize(width, blank.clone());
    }
    if values.len() < height {
        values.resize(height, vec![blank; width]);
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
