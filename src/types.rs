//! Core data model types for ingestion.
//!
//! A format parser turns a source file into one [`RawTable`] per sheet. The per-sheet pipeline in
//! [`crate::processing`] validates it against [`RequiredColumns`], renames columns through a
//! private copy of the [`ColumnMapping`], and produces a [`NormalizedSheet`]. Sheets are collected
//! into a [`NormalizedFile`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};

/// One parsed sheet: a header row plus raw string data rows.
///
/// Rows may be ragged (shorter or longer than the header).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Sheet name (`"csv"` by default for delimited text).
    pub name: String,
    /// Header cells, trimmed of surrounding whitespace.
    pub header: Vec<String>,
    /// Data rows, header excluded.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Create a table from a header and data rows.
    pub fn new(name: impl Into<String>, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            header,
            rows,
        }
    }

    /// Split the first row off as the (trimmed) header. An empty input yields an empty header.
    pub fn from_rows(name: impl Into<String>, mut rows: Vec<Vec<String>>) -> Self {
        let header = if rows.is_empty() {
            Vec::new()
        } else {
            rows.remove(0)
                .into_iter()
                .map(|h| h.trim().to_string())
                .collect()
        };
        Self::new(name, header, rows)
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Ordered mapping from source header name to canonical output name.
///
/// Each sheet works on its own copy; pruning removes entries in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<String, String>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a `source -> canonical` entry, returning the previous canonical name if any.
    pub fn insert(&mut self, source: impl Into<String>, canonical: impl Into<String>) -> Option<String> {
        self.0.insert(source.into(), canonical.into())
    }

    /// Canonical name for a source header, if mapped.
    pub fn get(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.0.contains_key(source)
    }

    pub fn remove(&mut self, source: &str) -> Option<String> {
        self.0.remove(source)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(source, canonical)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Source header names that must all appear in a sheet's header row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredColumns(BTreeSet<String>);

impl RequiredColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RequiredColumns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Caller-supplied column contract: which headers are required and how to rename them.
///
/// Loadable from JSON:
///
/// ```
/// use sheet_ingest::types::ColumnSpec;
///
/// let spec = ColumnSpec::from_json_str(
///     r#"{"required": ["姓名"], "mapping": {"姓名": "name", "更新时间": "updated_at"}}"#,
/// )
/// .unwrap();
/// assert_eq!(spec.mapping.get("姓名"), Some("name"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(default)]
    pub required: RequiredColumns,
    pub mapping: ColumnMapping,
}

impl ColumnSpec {
    pub fn new(required: RequiredColumns, mapping: ColumnMapping) -> Self {
        Self { required, mapping }
    }

    /// Parse a spec from JSON text.
    pub fn from_json_str(json: &str) -> IngestionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a spec from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|e| match e {
            IngestionError::Config { message } => IngestionError::Config {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }
}

/// One normalized sheet. Every row has exactly `header.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedSheet {
    pub name: String,
    /// Canonical column names in source header order.
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl NormalizedSheet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of a canonical column in [`Self::header`].
    pub fn index_of(&self, canonical: &str) -> Option<usize> {
        self.header.iter().position(|h| h == canonical)
    }
}

/// A sheet that was skipped because its pipeline failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetFailure {
    pub sheet: String,
    pub message: String,
}

/// Terminal result of ingesting one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedFile {
    pub file_name: String,
    /// Sheets in source order.
    pub sheets: Vec<NormalizedSheet>,
    /// Sum of emitted rows across `sheets`.
    pub total_row_count: usize,
    /// Sheets skipped under [`crate::ingestion::SheetErrorPolicy::SkipSheet`].
    pub skipped_sheets: Vec<SheetFailure>,
}

impl NormalizedFile {
    /// Collect sheets (in source order) and stamp the file name.
    pub fn assemble(
        file_name: impl Into<String>,
        sheets: Vec<NormalizedSheet>,
        skipped_sheets: Vec<SheetFailure>,
    ) -> Self {
        let total_row_count = sheets.iter().map(NormalizedSheet::row_count).sum();
        Self {
            file_name: file_name.into(),
            sheets,
            total_row_count,
            skipped_sheets,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&NormalizedSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
