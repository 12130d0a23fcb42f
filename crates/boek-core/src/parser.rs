//! CSV reader and writer for the local book list

use crate::error::{Error, Result};
use crate::table::Table;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Parse a CSV file into a Table
pub fn parse_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    read_table(BufReader::new(file), path)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    read_table(content.as_bytes(), Path::new(source_name))
}

fn read_table<R: Read>(reader: R, path: &Path) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Table::from_raw(&path.display().to_string(), &headers, rows)
}

/// Write a table as CSV (header row first)
pub fn write_csv<W: Write>(table: &Table, writer: W, path: &Path) -> Result<()> {
    let csv_err = |e| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(csv_err)?;
    for row in &table.rows {
        csv_writer.write_record(&row.cells).map_err(csv_err)?;
    }
    csv_writer.flush()?;
    Ok(())
}
