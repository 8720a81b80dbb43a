//! Ingestion entrypoints and format parsers.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which:
//!
//! - picks a parser by file extension (or you can force one via [`IngestionOptions`])
//! - runs every sheet through [`crate::processing::normalize_table`]
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific parsers implement [`SourceParser`]:
//! - [`csv`]
//! - [`excel`]
//!
//! Directory and glob expansion live in [`discovery`].

pub mod csv;
pub mod discovery;
pub mod excel;
pub mod observability;
pub mod source;
pub mod unified;

pub use discovery::{discover_sources, expand_glob};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    ObserverEvent, StdErrObserver, TracingObserver,
};
pub use source::SourceParser;
pub use unified::{
    ingest_from_bytes, ingest_from_path, is_supported_path, read_raw_tables, IngestionOptions, IngestionRequest,
    SheetErrorPolicy, SourceFormat,
};
