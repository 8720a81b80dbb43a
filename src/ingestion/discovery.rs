//! Finding input files on disk.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IngestionError, IngestionResult};

use super::unified::is_supported_path;

/// Recursively list `.xlsx`/`.xls`/`.csv` files under `dir`, sorted by path.
///
/// Hidden files and directories and spreadsheet lock files (`~$report.xlsx`) are skipped.
pub fn discover_sources(dir: impl AsRef<Path>) -> IngestionResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let walker = WalkDir::new(dir.as_ref())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored_name(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_supported_path(entry.path()) {
            out.push(entry.into_path());
        }
    }
    out.sort();
    tracing::debug!(dir = %dir.as_ref().display(), found = out.len(), "discovered sources");
    Ok(out)
}

/// Expand a glob pattern (e.g. `exports/**/*.csv`) into supported files, sorted by path.
pub fn expand_glob(pattern: &str) -> IngestionResult<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| IngestionError::Config {
        message: format!("invalid glob pattern '{pattern}': {e}"),
    })?;

    let mut out = Vec::new();
    for path in paths {
        let path = path.map_err(|e| IngestionError::Io(e.into()))?;
        let ignored = path
            .file_name()
            .map(|n| is_ignored_name(&n.to_string_lossy()))
            .unwrap_or(true);
        if path.is_file() && !ignored && is_supported_path(&path) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn is_ignored_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with("~$")
}

fn walk_error(err: walkdir::Error) -> IngestionError {
    let message = err.to_string();
    match err.into_io_error() {
        Some(e) => IngestionError::Io(e),
        None => IngestionError::Io(io::Error::other(message)),
    }
}
