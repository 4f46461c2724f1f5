//! Raw Row Model and Loading
//!
//! A spreadsheet row is a flat, ordered mapping of column name → scalar.
//! Column names are kept exactly as they appear in the source (no case or
//! whitespace normalization) because the field extractor matches on them
//! tolerantly and scans them in column order.
//!
//! Loaders:
//! - `load_csv_rows`: CSV via Polars, every column read as text
//! - `rows_from_json`: array of JSON objects (key order preserved)

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Empty,
}

impl Scalar {
    /// True for empty cells and blank text
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Empty => true,
            Scalar::Text(s) => s.trim().is_empty(),
            Scalar::Number(_) => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Empty => Ok(()),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<&Value> for Scalar {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Empty,
            Value::Number(n) => n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Empty),
            Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(other.to_string()),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Scalar::Number(n) => serializer.serialize_f64(*n),
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Empty => serializer.serialize_none(),
        }
    }
}

/// One spreadsheet row: column name → value, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, Scalar)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert (replaces an existing column of the same name)
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Scalar>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Exact-name lookup
    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    /// Cells in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Load rows from a CSV file with a header line
///
/// Every column is read as text so that mixed cells ("12.5", "NA", "") survive
/// untouched; numeric interpretation is left to the field extractor.
pub fn load_csv_rows(path: &Path) -> Result<Vec<RawRow>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))?;

    rows_from_dataframe(&df)
}

/// Convert a string-typed DataFrame into rows (column order preserved)
pub fn rows_from_dataframe(df: &DataFrame) -> Result<Vec<RawRow>> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();
        let values = column
            .str()
            .with_context(|| format!("Column '{}' is not string type", name))?;
        columns.push((name, values));
    }

    let rows = (0..df.height())
        .map(|idx| {
            columns
                .iter()
                .map(|(name, values)| {
                    let cell = match values.get(idx) {
                        Some(text) => Scalar::Text(text.to_string()),
                        None => Scalar::Empty,
                    };
                    (name.clone(), cell)
                })
                .collect::<RawRow>()
        })
        .collect();

    Ok(rows)
}

/// Parse rows from a JSON array of flat objects
pub fn rows_from_json(json: &str) -> Result<Vec<RawRow>> {
    let objects: Vec<serde_json::Map<String, Value>> = serde_json::from_str(json)
        .with_context(|| "Failed to parse rows JSON (expected an array of objects)")?;

    Ok(objects
        .iter()
        .map(|object| object.iter().map(|(k, v)| (k.clone(), Scalar::from(v))).collect())
        .collect())
}
