//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which reads a `.xlsx`, `.xls` or `.csv` file,
//! validates each sheet against a [`ColumnSpec`], and returns a [`NormalizedFile`].
//!
//! - If [`IngestionOptions::format`] is `None`, the format is inferred from the file extension.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts and
//!   skipped sheets are reported to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::processing::{normalize_table, TemporalMarkers, DEFAULT_TEMPORAL_MARKERS};
use crate::types::{ColumnSpec, NormalizedFile, RawTable, SheetFailure};

use super::csv::{CsvParser, CSV_SHEET_NAME};
use super::excel::{XlsParser, XlsxParser};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::source::SourceParser;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Zip/XML spreadsheet workbook.
    Xlsx,
    /// Legacy binary spreadsheet workbook.
    Xls,
    /// Delimited text of unknown encoding.
    Csv,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive, leading dot optional).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Infer the format from a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .and_then(Self::from_extension)
    }
}

/// Whether `path` has an extension this crate can ingest.
pub fn is_supported_path(path: impl AsRef<Path>) -> bool {
    SourceFormat::from_path(path).is_some()
}

/// What to do when one sheet of a multi-sheet workbook fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetErrorPolicy {
    /// Record the failure in [`NormalizedFile::skipped_sheets`] and keep going. If no sheet
    /// succeeds, the first sheet error is returned for the whole file.
    #[default]
    SkipSheet,
    /// Fail the whole file on the first sheet error.
    AbortFile,
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, infer format from file extension.
    pub format: Option<SourceFormat>,
    /// CSV charset label that overrides detection (e.g. `"GBK"`).
    pub encoding: Option<String>,
    /// CSV field delimiter.
    pub csv_delimiter: u8,
    /// Sheet name given to CSV input.
    pub csv_sheet_name: String,
    /// Markers that flag a canonical column as temporal; see [`TemporalMarkers`].
    pub temporal_markers: Vec<String>,
    /// Per-sheet failure handling for workbooks.
    pub sheet_error_policy: SheetErrorPolicy,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("encoding", &self.encoding)
            .field("csv_delimiter", &(self.csv_delimiter as char))
            .field("csv_sheet_name", &self.csv_sheet_name)
            .field("temporal_markers", &self.temporal_markers)
            .field("sheet_error_policy", &self.sheet_error_policy)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            encoding: None,
            csv_delimiter: b',',
            csv_sheet_name: CSV_SHEET_NAME.to_string(),
            temporal_markers: DEFAULT_TEMPORAL_MARKERS.iter().map(|m| m.to_string()).collect(),
            sheet_error_policy: SheetErrorPolicy::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

impl IngestionOptions {
    /// The parser for `format`, configured from these options.
    pub fn parser_for(&self, format: SourceFormat) -> Box<dyn SourceParser> {
        match format {
            SourceFormat::Xlsx => Box::new(XlsxParser),
            SourceFormat::Xls => Box::new(XlsParser),
            SourceFormat::Csv => Box::new(CsvParser {
                delimiter: self.csv_delimiter,
                encoding: self.encoding.clone(),
                sheet_name: self.csv_sheet_name.clone(),
            }),
        }
    }
}

/// Unified ingestion entry point for path-based sources.
///
/// The whole file is read into memory, parsed by the format's parser, and each sheet runs
/// through [`crate::processing::normalize_table`] with its own copy of `spec.mapping`.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with sheet/row stats
/// - `on_sheet_skipped` for each sheet skipped under [`SheetErrorPolicy::SkipSheet`]
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// # Examples
///
/// ```no_run
/// use sheet_ingest::ingestion::{ingest_from_path, IngestionOptions};
/// use sheet_ingest::types::ColumnSpec;
///
/// # fn main() -> Result<(), sheet_ingest::IngestionError> {
/// let spec = ColumnSpec::from_json_str(
///     r#"{"required": ["姓名"], "mapping": {"姓名": "name", "更新时间": "updated_at"}}"#,
/// )?;
/// let file = ingest_from_path("people.csv", &spec, &IngestionOptions::default())?;
/// println!("rows={}", file.total_row_count);
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format and encoding
///
/// ```no_run
/// use sheet_ingest::ingestion::{ingest_from_path, IngestionOptions, SourceFormat};
/// use sheet_ingest::types::ColumnSpec;
///
/// # fn main() -> Result<(), sheet_ingest::IngestionError> {
/// let spec = ColumnSpec::from_json_path("columns.json")?;
/// let opts = IngestionOptions {
///     format: Some(SourceFormat::Csv),
///     encoding: Some("GB18030".to_string()),
///     ..Default::default()
/// };
/// let file = ingest_from_path("export_without_extension", &spec, &opts)?;
/// println!("sheets={}", file.sheets.len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    spec: &ColumnSpec,
    options: &IngestionOptions,
) -> IngestionResult<NormalizedFile> {
    let path = path.as_ref();
    let format = resolve_format(path, options);
    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format: format.as_ref().ok().copied(),
    };

    let result = format.and_then(|fmt| {
        let tables = options.parser_for(fmt).parse_path(path)?;
        normalize_tables(&ctx, display_name(path), tables, spec, options)
    });
    report(options, &ctx, &result);
    result
}

/// Ingest an in-memory file. `file_name` supplies the extension hint (unless
/// [`IngestionOptions::format`] is set) and is stamped on the result.
pub fn ingest_from_bytes(
    file_name: &str,
    bytes: &[u8],
    spec: &ColumnSpec,
    options: &IngestionOptions,
) -> IngestionResult<NormalizedFile> {
    let path = Path::new(file_name);
    let format = resolve_format(path, options);
    let ctx = IngestionContext {
        path: path.to_path_buf(),
        format: format.as_ref().ok().copied(),
    };

    let result = format.and_then(|fmt| {
        let tables = options.parser_for(fmt).parse(bytes)?;
        normalize_tables(&ctx, file_name.to_string(), tables, spec, options)
    });
    report(options, &ctx, &result);
    result
}

/// Parse a file into raw per-sheet tables without validation or normalization.
pub fn read_raw_tables(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<Vec<RawTable>> {
    let path = path.as_ref();
    let fmt = resolve_format(path, options)?;
    options.parser_for(fmt).parse_path(path)
}

fn normalize_tables(
    ctx: &IngestionContext,
    file_name: String,
    tables: Vec<RawTable>,
    spec: &ColumnSpec,
    options: &IngestionOptions,
) -> IngestionResult<NormalizedFile> {
    let markers = TemporalMarkers::new(&options.temporal_markers);
    let mut sheets = Vec::with_capacity(tables.len());
    let mut failures: Vec<(String, IngestionError)> = Vec::new();

    for table in &tables {
        match normalize_table(table, &spec.required, spec.mapping.clone(), &markers) {
            Ok(sheet) => sheets.push(sheet),
            Err(e) if options.sheet_error_policy == SheetErrorPolicy::AbortFile => return Err(e),
            Err(e) => failures.push((table.name.clone(), e)),
        }
    }

    if sheets.is_empty() && !failures.is_empty() {
        return Err(failures.swap_remove(0).1);
    }

    let mut skipped = Vec::with_capacity(failures.len());
    for (sheet, error) in failures {
        tracing::warn!(file = %file_name, sheet = %sheet, %error, "skipping sheet");
        if let Some(obs) = options.observer.as_ref() {
            obs.on_sheet_skipped(ctx, &sheet, &error);
        }
        skipped.push(SheetFailure {
            sheet,
            message: error.to_string(),
        });
    }

    Ok(NormalizedFile::assemble(file_name, sheets, skipped))
}

fn report(options: &IngestionOptions, ctx: &IngestionContext, result: &IngestionResult<NormalizedFile>) {
    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(file) => obs.on_success(
            ctx,
            IngestionStats {
                sheets: file.sheets.len(),
                rows: file.total_row_count,
                skipped_sheets: file.skipped_sheets.len(),
            },
        ),
        Err(e) => {
            let sev = severity_for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::UnsupportedFormat { .. }
        | IngestionError::UnsupportedEncoding { .. }
        | IngestionError::DecodeFailure { .. }
        | IngestionError::MissingRequiredColumns { .. }
        | IngestionError::MalformedSource { .. }
        | IngestionError::Config { .. } => IngestionSeverity::Error,
    }
}

fn resolve_format(path: &Path, options: &IngestionOptions) -> IngestionResult<SourceFormat> {
    match options.format {
        Some(f) => Ok(f),
        None => infer_format_from_path(path),
    }
}

fn infer_format_from_path(path: &Path) -> IngestionResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::UnsupportedFormat {
            message: format!("path has no extension ({})", path.display()),
        })?;

    SourceFormat::from_extension(ext).ok_or_else(|| IngestionError::UnsupportedFormat {
        message: format!(
            "extension '{ext}' is not one of .xlsx/.xls/.csv ({})",
            path.display()
        ),
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convenience helper for callers that want an owned request object.
///
/// Each request owns its [`ColumnSpec`], so requests can run concurrently (see
/// [`crate::execution::BatchEngine`]) without sharing a mapping.
#[derive(Clone)]
pub struct IngestionRequest {
    /// Path to the input file.
    pub path: PathBuf,
    /// Required columns and header mapping.
    pub spec: ColumnSpec,
    /// Options controlling ingestion.
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("path", &self.path)
            .field("required", &self.spec.required.len())
            .field("mapping", &self.spec.mapping.len())
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    pub fn new(path: impl Into<PathBuf>, spec: ColumnSpec, options: IngestionOptions) -> Self {
        Self {
            path: path.into(),
            spec,
            options,
        }
    }

    /// Execute the request by calling [`ingest_from_path`].
    pub fn run(&self) -> IngestionResult<NormalizedFile> {
        ingest_from_path(&self.path, &self.spec, &self.options)
    }
}
