use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::error::IngestionError;
use crate::processing::dates::CANONICAL_LAYOUT;

use super::unified::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal, e.g. a skipped sheet).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about an ingestion attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// The input path (or file name for in-memory sources).
    pub path: PathBuf,
    /// Format used for ingestion; `None` if it could not be determined.
    pub format: Option<SourceFormat>,
}

/// Stats reported on successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of normalized sheets.
    pub sheets: usize,
    /// Total emitted rows across sheets.
    pub rows: usize,
    /// Sheets skipped because their pipeline failed.
    pub skipped_sheets: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when ingestion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when ingestion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when an ingestion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called for each sheet skipped while the rest of the file still succeeded.
    fn on_sheet_skipped(&self, _ctx: &IngestionContext, _sheet: &str, _error: &IngestionError) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_sheet_skipped(&self, ctx: &IngestionContext, sheet: &str, error: &IngestionError) {
        for o in &self.observers {
            o.on_sheet_skipped(ctx, sheet, error);
        }
    }
}

/// One observer callback rendered as a single `key=value` log line.
#[derive(Debug, Clone, Copy)]
pub enum ObserverEvent<'a> {
    /// A file produced at least one sheet.
    Succeeded { ctx: &'a IngestionContext, stats: IngestionStats },
    /// A file failed; `alert` is set when the failure crossed the alert threshold.
    Failed {
        ctx: &'a IngestionContext,
        severity: IngestionSeverity,
        error: &'a IngestionError,
        alert: bool,
    },
    /// A sheet was dropped while the rest of its file survived.
    SheetSkipped {
        ctx: &'a IngestionContext,
        sheet: &'a str,
        error: &'a IngestionError,
    },
}

fn format_label(format: Option<SourceFormat>) -> &'static str {
    match format {
        Some(SourceFormat::Csv) => "csv",
        Some(SourceFormat::Xlsx) => "xlsx",
        Some(SourceFormat::Xls) => "xls",
        None => "-",
    }
}

impl fmt::Display for ObserverEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ObserverEvent::Succeeded { ctx, stats } => write!(
                f,
                "ok file={} format={} sheets={} rows={} skipped={}",
                ctx.path.display(),
                format_label(ctx.format),
                stats.sheets,
                stats.rows,
                stats.skipped_sheets
            ),
            ObserverEvent::Failed {
                ctx,
                severity,
                error,
                alert,
            } => write!(
                f,
                "{} severity={severity:?} file={} format={} error={error}",
                if alert { "alert" } else { "fail" },
                ctx.path.display(),
                format_label(ctx.format)
            ),
            ObserverEvent::SheetSkipped { ctx, sheet, error } => {
                write!(f, "skip file={} sheet={sheet} error={error}", ctx.path.display())
            }
        }
    }
}

/// Prints ingestion events to stderr, prefixed with `[sheet-ingest]`.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl StdErrObserver {
    fn emit(&self, event: ObserverEvent<'_>) {
        eprintln!("[sheet-ingest] {event}");
    }
}

impl IngestionObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.emit(ObserverEvent::Succeeded { ctx, stats });
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.emit(ObserverEvent::Failed {
            ctx,
            severity,
            error,
            alert: false,
        });
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.emit(ObserverEvent::Failed {
            ctx,
            severity,
            error,
            alert: true,
        });
    }

    fn on_sheet_skipped(&self, ctx: &IngestionContext, sheet: &str, error: &IngestionError) {
        self.emit(ObserverEvent::SheetSkipped { ctx, sheet, error });
    }
}

/// Forwards ingestion events to `tracing` under the `sheet_ingest` target.
///
/// Installing a subscriber is left to the application.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            target: "sheet_ingest",
            path = %ctx.path.display(),
            format = ?ctx.format,
            sheets = stats.sheets,
            rows = stats.rows,
            skipped_sheets = stats.skipped_sheets,
            "ingestion succeeded"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            target: "sheet_ingest",
            path = %ctx.path.display(),
            format = ?ctx.format,
            ?severity,
            %error,
            "ingestion failed"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            target: "sheet_ingest",
            alert = true,
            path = %ctx.path.display(),
            format = ?ctx.format,
            ?severity,
            %error,
            "ingestion alert"
        );
    }

    fn on_sheet_skipped(&self, ctx: &IngestionContext, sheet: &str, error: &IngestionError) {
        tracing::warn!(
            target: "sheet_ingest",
            path = %ctx.path.display(),
            sheet,
            %error,
            "sheet skipped"
        );
    }
}

/// Appends ingestion events to a local log file, one timestamped line each.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Log to `path`, creating it on the first event.
    ///
    /// Best-effort: open and write errors are dropped.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn emit(&self, event: ObserverEvent<'_>) {
        let _guard = self.lock.lock().ok();
        let Ok(mut out) = OpenOptions::new().create(true).append(true).open(&self.path) else {
            return;
        };
        let stamp = Local::now().format(CANONICAL_LAYOUT);
        let _ = writeln!(out, "{stamp} {event}");
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.emit(ObserverEvent::Succeeded { ctx, stats });
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.emit(ObserverEvent::Failed {
            ctx,
            severity,
            error,
            alert: false,
        });
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.emit(ObserverEvent::Failed {
            ctx,
            severity,
            error,
            alert: true,
        });
    }

    fn on_sheet_skipped(&self, ctx: &IngestionContext, sheet: &str, error: &IngestionError) {
        self.emit(ObserverEvent::SheetSkipped { ctx, sheet, error });
    }
}
