//! Spreadsheet parsers for `.xlsx` (zip/XML) and `.xls` (legacy binary) workbooks.
//!
//! Both read every worksheet in workbook order. The first non-empty row of a sheet's used
//! range is its header; a sheet with no cells yields a table with an empty header, which the
//! header validator rejects if columns are required.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Reader, Xls, Xlsx};

use crate::error::{IngestionError, IngestionResult};
use crate::processing::dates::CANONICAL_LAYOUT;
use crate::types::RawTable;

use super::source::SourceParser;
use super::unified::SourceFormat;

/// `.xlsx` workbook parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxParser;

impl SourceParser for XlsxParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Xlsx
    }

    fn parse(&self, bytes: &[u8]) -> IngestionResult<Vec<RawTable>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
        read_workbook(&mut workbook)
    }
}

/// `.xls` workbook parser.
///
/// Text encoding is embedded in the binary format (codepage records), so no detection runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsParser;

impl SourceParser for XlsParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Xls
    }

    fn parse(&self, bytes: &[u8]) -> IngestionResult<Vec<RawTable>> {
        let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))?;
        read_workbook(&mut workbook)
    }
}

fn read_workbook<W, RS>(workbook: &mut W) -> IngestionResult<Vec<RawTable>>
where
    W: Reader<RS>,
    RS: Read + Seek,
    IngestionError: From<W::Error>,
{
    let sheets: Vec<String> = workbook.sheet_names().to_vec();
    if sheets.is_empty() {
        return Err(IngestionError::MalformedSource {
            message: "workbook has no sheets".to_string(),
        });
    }

    let mut tables = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let range = workbook.worksheet_range(&sheet)?;
        tracing::trace!(sheet = %sheet, dims = ?range.get_size(), "read worksheet range");
        tables.push(range_to_table(&sheet, &range));
    }
    Ok(tables)
}

fn range_to_table(sheet: &str, range: &calamine::Range<Data>) -> RawTable {
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .skip_while(|row| row.iter().all(String::is_empty))
        .collect();
    RawTable::from_rows(sheet, rows)
}

/// Render a cell as raw text. Whole floats print without a fraction; native date cells print in
/// the canonical date layout.
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return dt.to_string();
            }
            dt.as_datetime()
                .map(|d| d.format(CANONICAL_LAYOUT).to_string())
                .unwrap_or_else(|| dt.to_string())
        }
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}
