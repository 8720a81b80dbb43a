//! Batch execution: ingest many files in parallel.
//!
//! Files never share a mapping, a reader or any other mutable state, so each
//! [`IngestionRequest`] runs independently on a rayon worker. Outcomes come back in request
//! order, one per file, whether it succeeded or not.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::IngestionResult;
use crate::ingestion::{IngestionOptions, IngestionRequest};
use crate::types::{ColumnSpec, NormalizedFile};

/// Configuration for the [`BatchEngine`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self { num_threads: Some(n) }
    }
}

/// Result of one file in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub path: PathBuf,
    pub result: IngestionResult<NormalizedFile>,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub files: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Emitted rows across succeeded files.
    pub rows: usize,
    /// Skipped sheets across succeeded files.
    pub skipped_sheets: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        let mut s = BatchSummary {
            files: outcomes.len(),
            ..Default::default()
        };
        for o in outcomes {
            match &o.result {
                Ok(file) => {
                    s.succeeded += 1;
                    s.rows += file.total_row_count;
                    s.skipped_sheets += file.skipped_sheets.len();
                }
                Err(_) => s.failed += 1,
            }
        }
        s
    }
}

/// Runs ingestion requests on a dedicated rayon pool.
pub struct BatchEngine {
    pool: ThreadPool,
}

impl BatchEngine {
    /// Create a new engine with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads == Some(0)`.
    pub fn new(opts: BatchOptions) -> Self {
        if let Some(n) = opts.num_threads {
            assert!(n > 0, "num_threads must be > 0 when set");
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .expect("failed to build rayon thread pool");

        Self { pool }
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every request; outcomes are returned in request order.
    pub fn run(&self, requests: &[IngestionRequest]) -> Vec<BatchOutcome> {
        let start = Instant::now();
        let outcomes: Vec<BatchOutcome> = self.pool.install(|| {
            requests
                .par_iter()
                .map(|req| {
                    let t = Instant::now();
                    let result = req.run();
                    BatchOutcome {
                        path: req.path.clone(),
                        result,
                        elapsed: t.elapsed(),
                    }
                })
                .collect()
        });

        let summary = BatchSummary::from_outcomes(&outcomes);
        tracing::info!(
            files = summary.files,
            succeeded = summary.succeeded,
            failed = summary.failed,
            rows = summary.rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch finished"
        );
        outcomes
    }

    /// Run the same spec and options over a list of paths.
    pub fn run_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        spec: &ColumnSpec,
        options: &IngestionOptions,
    ) -> Vec<BatchOutcome> {
        let requests: Vec<IngestionRequest> = paths
            .iter()
            .map(|p| IngestionRequest::new(p.as_ref(), spec.clone(), options.clone()))
            .collect();
        self.run(&requests)
    }
}

impl Default for BatchEngine {
    fn default() -> Self {
        Self::new(BatchOptions::default())
    }
}
