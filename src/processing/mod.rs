//! Per-sheet normalization pipeline.
//!
//! [`normalize_table`] runs the stages in a fixed order over one [`RawTable`]:
//!
//! 1. [`header::validate_header`]: fail fast if required columns are missing
//! 2. [`emptiness::ColumnEmptiness::scan`]: one full pass over all data rows
//! 3. [`emptiness::prune_mapping`]: drop mapping entries for never-populated columns
//! 4. [`rows::RowNormalizer`]: rename, reformat dates, align to the output header
//!
//! The mapping is taken by value, so each sheet prunes its own copy.
//!
//! ```rust
//! use sheet_ingest::processing::{normalize_table, TemporalMarkers};
//! use sheet_ingest::types::{ColumnMapping, RawTable, RequiredColumns};
//!
//! let table = RawTable::new(
//!     "csv",
//!     vec!["姓名".into(), "更新时间".into()],
//!     vec![
//!         vec!["Alice".into(), "2024年01月02日03时04分05秒".into()],
//!         vec!["Bob".into(), "".into()],
//!     ],
//! );
//! let required: RequiredColumns = ["姓名"].into_iter().collect();
//! let mapping: ColumnMapping = [("姓名", "name"), ("更新时间", "updated_at")].into_iter().collect();
//!
//! let sheet = normalize_table(&table, &required, mapping, &TemporalMarkers::default()).unwrap();
//! assert_eq!(sheet.header, vec!["name", "updated_at"]);
//! assert_eq!(sheet.rows[0], vec!["Alice", "2024-01-02 03:04:05"]);
//! assert_eq!(sheet.rows[1], vec!["Bob", ""]);
//! ```

pub mod dates;
pub mod emptiness;
pub mod header;
pub mod rows;

use crate::error::IngestionResult;
use crate::types::{ColumnMapping, NormalizedSheet, RawTable, RequiredColumns};

pub use emptiness::{prune_mapping, ColumnEmptiness};
pub use header::validate_header;
pub use rows::{output_header, RowNormalizer, TemporalMarkers, DEFAULT_TEMPORAL_MARKERS};

/// Validate, prune and normalize one sheet.
pub fn normalize_table(
    table: &RawTable,
    required: &RequiredColumns,
    mut mapping: ColumnMapping,
    markers: &TemporalMarkers,
) -> IngestionResult<NormalizedSheet> {
    validate_header(&table.name, &table.header, required)?;

    let emptiness = ColumnEmptiness::scan(table.header.len(), &table.rows);
    let pruned = prune_mapping(&table.header, emptiness, &mut mapping);
    if !pruned.is_empty() {
        tracing::debug!(sheet = %table.name, columns = ?pruned, "pruned empty columns from mapping");
    }

    let normalizer = RowNormalizer::new(&table.header, &mapping, markers);
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut dropped = 0usize;
    for raw in &table.rows {
        match normalizer.normalize(raw) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }
    tracing::trace!(sheet = %table.name, emitted = rows.len(), dropped, "normalized sheet rows");

    Ok(NormalizedSheet {
        name: table.name.clone(),
        header: normalizer.into_output_header(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestionError;

    fn s(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn spec() -> (RequiredColumns, ColumnMapping) {
        (
            ["姓名"].into_iter().collect(),
            [("姓名", "name"), ("更新时间", "updated_at")].into_iter().collect(),
        )
    }

    #[test]
    fn all_empty_column_is_pruned_from_header() {
        let (req, map) = spec();
        let table = RawTable::new("csv", s(&["姓名", "更新时间"]), vec![s(&["Alice", ""]), s(&["Bob", ""])]);
        let sheet = normalize_table(&table, &req, map, &TemporalMarkers::default()).unwrap();
        assert_eq!(sheet.header, vec!["name"]);
        assert_eq!(sheet.rows, vec![s(&["Alice"]), s(&["Bob"])]);
    }

    #[test]
    fn every_row_matches_header_width() {
        let (req, map) = spec();
        let table = RawTable::new(
            "csv",
            s(&["姓名", "更新时间", "备注"]),
            vec![s(&["A"]), s(&["B", "2024-01-02", "x", "extra"]), s(&["", "", "only note"])],
        );
        let sheet = normalize_table(&table, &req, map, &TemporalMarkers::default()).unwrap();
        assert_eq!(sheet.row_count(), 2);
        for row in &sheet.rows {
            assert_eq!(row.len(), sheet.header.len());
        }
    }

    #[test]
    fn missing_required_column_processes_no_rows() {
        let (req, map) = spec();
        let table = RawTable::new("csv", s(&["name"]), vec![s(&["Alice"])]);
        let err = normalize_table(&table, &req, map, &TemporalMarkers::default()).unwrap_err();
        match err {
            IngestionError::MissingRequiredColumns { missing, .. } => assert_eq!(missing, vec!["姓名"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn caller_mapping_is_not_mutated() {
        let (req, map) = spec();
        let table = RawTable::new("csv", s(&["姓名", "更新时间"]), vec![s(&["Alice", ""])]);
        let _ = normalize_table(&table, &req, map.clone(), &TemporalMarkers::default()).unwrap();
        assert!(map.contains("更新时间"));
    }
}
