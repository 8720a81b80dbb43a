//! `sheet-ingest` reads `.xlsx`, `.xls` and `.csv` files whose text encoding is unknown, checks
//! each sheet's header against a set of required columns, renames columns to canonical names,
//! drops columns that never hold data, and reformats date-like values.
//!
//! The primary entrypoint is [`ingestion::ingest_from_path`], which picks a parser from the file
//! extension (or you can force a format via [`ingestion::IngestionOptions`]).
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension, case-insensitive):**
//!
//! - **CSV**: `.csv`, in UTF-8, GBK, GB18030 or ISO-8859-1 (detected from the bytes, or forced)
//! - **Workbooks**: `.xlsx` and legacy `.xls`; every worksheet is read in workbook order
//!
//! **Column contract:**
//!
//! A [`types::ColumnSpec`] carries the [`types::RequiredColumns`] every header row must contain
//! and the [`types::ColumnMapping`] from source header names to canonical names. Each sheet gets
//! its own copy of the mapping, so pruning one sheet never affects another.
//!
//! **Output:**
//!
//! A [`types::NormalizedFile`] holding one [`types::NormalizedSheet`] per sheet. Every output row
//! has exactly one cell per canonical header column; cells are strings and absent values are `""`.
//! Values in temporal columns (canonical name containing `时间`, or a word such as `date` or `at`) are
//! rewritten as `YYYY-MM-DD HH:MM:SS` when they parse as a date.
//!
//! ## Quick example
//!
//! ```no_run
//! use sheet_ingest::ingestion::{ingest_from_path, IngestionOptions};
//! use sheet_ingest::types::{ColumnMapping, ColumnSpec, RequiredColumns};
//!
//! # fn main() -> Result<(), sheet_ingest::IngestionError> {
//! let required: RequiredColumns = ["姓名"].into_iter().collect();
//! let mapping: ColumnMapping = [("姓名", "name"), ("更新时间", "updated_at")].into_iter().collect();
//! let spec = ColumnSpec::new(required, mapping);
//!
//! let file = ingest_from_path("people.xlsx", &spec, &IngestionOptions::default())?;
//! for sheet in &file.sheets {
//!     println!("{}: {:?} ({} rows)", sheet.name, sheet.header, sheet.row_count());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Batches
//!
//! ```no_run
//! use sheet_ingest::execution::{BatchEngine, BatchOptions, BatchSummary};
//! use sheet_ingest::ingestion::{discover_sources, IngestionOptions};
//! use sheet_ingest::types::ColumnSpec;
//!
//! # fn main() -> Result<(), sheet_ingest::IngestionError> {
//! let spec = ColumnSpec::from_json_path("columns.json")?;
//! let paths = discover_sources("incoming/")?;
//! let engine = BatchEngine::new(BatchOptions { num_threads: Some(4) });
//! let outcomes = engine.run_paths(&paths, &spec, &IngestionOptions::default());
//! println!("{:?}", BatchSummary::from_outcomes(&outcomes));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: unified entrypoints, format parsers, observers and file discovery
//! - [`processing`]: header validation, emptiness pruning, row normalization and date parsing
//! - [`encoding`]: charset detection and strict decoding
//! - [`execution`]: parallel batch ingestion
//! - [`types`]: raw and normalized table types
//! - [`error`]: error types used across ingestion

pub mod encoding;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod processing;
pub mod types;

pub use error::{IngestionError, IngestionResult};
