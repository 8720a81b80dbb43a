//! The format-parser capability shared by every source format.

use std::path::Path;

use crate::error::IngestionResult;
use crate::types::RawTable;

use super::unified::SourceFormat;

/// Turns the bytes of one source file into one [`RawTable`] per sheet, in source order.
///
/// Parsers hold no state between calls; any reader they open lives only for one
/// [`SourceParser::parse`] call.
pub trait SourceParser: Send + Sync {
    /// The format this parser reads.
    fn format(&self) -> SourceFormat;

    /// Parse an in-memory file.
    fn parse(&self, bytes: &[u8]) -> IngestionResult<Vec<RawTable>>;

    /// Read `path` fully, then [`Self::parse`] it. The file handle is closed before parsing.
    fn parse_path(&self, path: &Path) -> IngestionResult<Vec<RawTable>> {
        let bytes = std::fs::read(path)?;
        self.parse(&bytes)
    }
}
