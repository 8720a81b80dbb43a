use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared by every stage: format dispatch, decoding, parsing,
/// header validation and normalization. Errors are scoped to one file (or one sheet of a
/// workbook); they never leave shared state behind.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV tokenizer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The file extension (or forced format) is not one of `.xlsx`, `.xls`, `.csv`.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// A charset label has no decoder.
    #[error("unsupported encoding '{label}'")]
    UnsupportedEncoding { label: String },

    /// Bytes could not be decoded as text under the chosen encoding.
    #[error("failed to decode input as {encoding} at line {line}")]
    DecodeFailure { encoding: String, line: usize },

    /// The header row lacks one or more required columns.
    #[error(
        "sheet '{sheet}': header is missing required columns [{}]; header must contain: {}",
        .missing.join(","),
        .expected.join(",")
    )]
    MissingRequiredColumns {
        sheet: String,
        /// Full required-column listing, sorted.
        expected: Vec<String>,
        /// Exactly the required names absent from the header, sorted.
        missing: Vec<String>,
    },

    /// Format-specific structural error (unreadable workbook, zero-row sheet, etc.).
    #[error("malformed source: {message}")]
    MalformedSource { message: String },

    /// Invalid caller configuration (column spec JSON, glob pattern).
    #[error("config error: {message}")]
    Config { message: String },
}

impl From<calamine::Error> for IngestionError {
    fn from(err: calamine::Error) -> Self {
        match err {
            calamine::Error::Io(e) => IngestionError::Io(e),
            other => IngestionError::MalformedSource {
                message: other.to_string(),
            },
        }
    }
}

impl From<calamine::XlsxError> for IngestionError {
    fn from(err: calamine::XlsxError) -> Self {
        calamine::Error::Xlsx(err).into()
    }
}

impl From<calamine::XlsError> for IngestionError {
    fn from(err: calamine::XlsError) -> Self {
        calamine::Error::Xls(err).into()
    }
}

impl From<serde_json::Error> for IngestionError {
    fn from(err: serde_json::Error) -> Self {
        IngestionError::Config {
            message: err.to_string(),
        }
    }
}
