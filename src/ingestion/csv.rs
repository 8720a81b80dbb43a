//! Delimited-text parser.

use std::io::Read;

use crate::encoding::{detect_charset, TextDecoder};
use crate::error::IngestionResult;
use crate::types::RawTable;

use super::source::SourceParser;
use super::unified::SourceFormat;

/// Sheet name given to the single table a CSV file produces.
pub const CSV_SHEET_NAME: &str = "csv";

/// Parses delimited text of unknown encoding into a single [`RawTable`].
///
/// Rules:
///
/// - The charset is detected from the bytes unless [`CsvParser::encoding`] forces a label.
/// - The first record is the header; header cells are trimmed.
/// - Records may have any number of fields.
/// - Quotes are lenient: a quote inside an unquoted field is literal, and an unterminated
///   quoted field runs to the end of input.
#[derive(Debug, Clone)]
pub struct CsvParser {
    pub delimiter: u8,
    /// Charset label that overrides detection.
    pub encoding: Option<String>,
    pub sheet_name: String,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: None,
            sheet_name: CSV_SHEET_NAME.to_string(),
        }
    }
}

impl CsvParser {
    /// Decoder for `bytes`: the forced label if set, otherwise the detected charset.
    pub fn decoder_for(&self, bytes: &[u8]) -> IngestionResult<TextDecoder> {
        match &self.encoding {
            Some(label) => TextDecoder::for_label(label),
            None => {
                let charset = detect_charset(bytes);
                tracing::debug!(%charset, bytes = bytes.len(), "detected csv charset");
                Ok(TextDecoder::for_charset(charset))
            }
        }
    }

    /// Parse already-decoded text.
    pub fn parse_text(&self, text: &str) -> IngestionResult<RawTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());
        read_csv_records(&mut rdr, &self.sheet_name)
    }
}

impl SourceParser for CsvParser {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn parse(&self, bytes: &[u8]) -> IngestionResult<Vec<RawTable>> {
        let decoder = self.decoder_for(bytes)?;
        let text = decoder.decode(bytes)?;
        Ok(vec![self.parse_text(&text)?])
    }
}

/// Read every record from an existing CSV reader; the first record becomes the header.
///
/// The reader should be built with `has_headers(false)` so the header is not swallowed.
pub fn read_csv_records<R: Read>(rdr: &mut csv::Reader<R>, sheet_name: &str) -> IngestionResult<RawTable> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable::from_rows(sheet_name, rows))
}
