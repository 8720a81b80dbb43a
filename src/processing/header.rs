//! Required-column validation for a sheet header.

use std::collections::HashSet;

use crate::error::{IngestionError, IngestionResult};
use crate::types::RequiredColumns;

/// Check that every required name appears in `header` (exact match after trimming).
///
/// Order of either side does not matter. A header with no cells at all while columns are
/// required means the sheet had no rows, reported as [`IngestionError::MalformedSource`];
/// otherwise a shortfall is [`IngestionError::MissingRequiredColumns`] listing both the
/// missing names and the full expected set.
pub fn validate_header(sheet: &str, header: &[String], required: &RequiredColumns) -> IngestionResult<()> {
    if required.is_empty() {
        return Ok(());
    }
    if header.is_empty() {
        return Err(IngestionError::MalformedSource {
            message: format!("sheet '{sheet}' has no rows (no header row found)"),
        });
    }

    let present: HashSet<&str> = header.iter().map(|h| h.trim()).collect();
    let found = required.iter().filter(|name| present.contains(name.trim())).count();
    if found == required.len() {
        return Ok(());
    }

    let missing = required
        .iter()
        .filter(|name| !present.contains(name.trim()))
        .map(str::to_string)
        .collect();
    Err(IngestionError::MissingRequiredColumns {
        sheet: sheet.to_string(),
        expected: required.iter().map(str::to_string).collect(),
        missing,
    })
}
