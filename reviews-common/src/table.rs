//! CSV artifact I/O
//!
//! Every intermediate artifact is a comma-separated UTF-8 file with a header
//! row. Typed rows go through serde; [`RawTable`] keeps arbitrary columns for
//! stages that must tolerate legacy or partial schemas.

use crate::models::CsvRow;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read every row of a typed artifact
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "Read CSV artifact");
    Ok(rows)
}

/// Write a typed artifact, header row included even when `rows` is empty
///
/// Parent directories are created on demand. The writer is flushed before
/// returning so the next stage always sees a complete file.
pub fn write_rows<T: Serialize + CsvRow>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "Wrote CSV artifact");
    Ok(())
}

/// Untyped table with named columns
///
/// Empty cells read as absent, the same way a missing value is treated
/// everywhere else in the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl RawTable {
    /// Load a table from disk
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }

        Ok(Self { headers, rows })
    }

    /// Build a table in memory (tests and adapters)
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| csv::StringRecord::from(r.to_vec())).collect(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value, `None` when the column is missing or the cell is empty
    pub fn cell(&self, row: usize, column: Option<usize>) -> Option<&str> {
        let column = column?;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .filter(|v| !v.is_empty())
    }
}
