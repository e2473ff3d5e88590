#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shooting incident CSV loader.
//!
//! Reads a comma-separated incident table into [`RawRecord`]s keyed by
//! [`Column`]. No values are interpreted here beyond trimming; typed parsing
//! helpers live in [`parsing`] and are applied by the cleaner.

pub mod parsing;
pub mod progress;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use nypd_shootings_incident_models::{Column, RawRecord};

/// Errors that can occur while loading the incident table.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be opened or read.
    #[error("Cannot read data source {path}: {source}")]
    DataSource {
        /// Path (or label) of the data source.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not a well-formed CSV table.
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        /// Path (or label) of the data source.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("Schema error in {path}: required column '{column}' is missing")]
    Schema {
        /// Path (or label) of the data source.
        path: String,
        /// The missing column.
        column: Column,
    },
}

/// The raw rows of one incident table, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    /// Where the rows came from (file path or caller-supplied label).
    pub label: String,
    /// Header row as it appeared in the file.
    pub headers: Vec<String>,
    /// Data rows in file order.
    pub records: Vec<RawRecord>,
}

impl RawTable {
    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads the incident table at `path`.
///
/// # Errors
///
/// * [`SourceError::DataSource`] if the file cannot be opened
/// * [`SourceError::Csv`] if the contents are not a readable CSV table
/// * [`SourceError::Schema`] if a required column is missing
pub fn load_raw(path: &Path) -> Result<RawTable, SourceError> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| SourceError::DataSource {
        path: label.clone(),
        source,
    })?;

    let table = read_raw(file, &label)?;
    log::info!("Read {} rows from {label}", table.len());
    Ok(table)
}

/// Reads an incident table from any reader. `label` names the source in
/// error messages.
///
/// # Errors
///
/// * [`SourceError::Csv`] if the contents are not a readable CSV table
/// * [`SourceError::Schema`] if a required column is missing
pub fn read_raw<R: Read>(reader: R, label: &str) -> Result<RawTable, SourceError> {
    let csv_error = |source| SourceError::Csv {
        path: label.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    // First matching header wins if a column is repeated.
    let mut positions: BTreeMap<Column, usize> = BTreeMap::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Ok(column) = header.parse::<Column>() {
            positions.entry(column).or_insert(idx);
        }
    }

    if let Some(&column) = Column::all().iter().find(|c| !positions.contains_key(c)) {
        return Err(SourceError::Schema {
            path: label.to_string(),
            column,
        });
    }

    let mut records = Vec::new();
    let mut line: u64 = 0;

    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        line += 1;

        let values = positions
            .iter()
            .map(|(&column, &idx)| (column, row.get(idx).unwrap_or("").trim().to_string()))
            .collect();

        records.push(RawRecord { line, values });
    }

    log::debug!(
        "Parsed {} rows with {} columns from {label}",
        records.len(),
        headers.len()
    );

    Ok(RawTable {
        label: label.to_string(),
        headers,
        records,
    })
}
