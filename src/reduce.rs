//! Fanning the per-cell accumulation out across a worker pool.
//!
//! The reduction is commutative and associative, so no ordering guarantee is
//! needed for correctness; executors still collect outcomes in the input
//! cell order so that single-threaded runs are bit-for-bit reproducible and
//! so the progress denominator is well defined.
//!
//! A failure inside one cell never aborts the run: the outcome carries the
//! error, the cell contributes nothing, and the caller reports the aggregate
//! failure count. The only shared mutable state is the progress counter,
//! which is a plain atomic.

use crate::accumulate::CellAccumulator;
use crate::error::Error;
use log::info;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Running completion counter shared by all workers.
pub struct Progress {
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one completed cell and log the running percentage.
    pub fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if self.total > 0 {
            info!(
                "computing xi: {:.2}%",
                done as f64 * 100.0 / self.total as f64
            );
        }
    }

    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }
}

/// The tagged result of one cell's accumulation.
pub struct CellOutcome {
    pub cell: u64,
    pub result: Result<CellAccumulator, Error>,
}

/// Count the failed cells in a collected reduction.
pub fn count_failures(outcomes: &[CellOutcome]) -> usize {
    outcomes.iter().filter(|o| o.result.is_err()).count()
}

/// The seam between the reduction and its scheduling backend.
///
/// `run` invokes `task` once per cell and returns one outcome per cell, in
/// the same order as the input list. Tasks only borrow shared read-only
/// state (the pixel maps and the grid), so they are `Sync` closures.
pub trait Executor {
    fn run<F>(&self, cells: &[u64], task: F) -> Vec<CellOutcome>
    where
        F: Fn(u64) -> Result<CellAccumulator, Error> + Sync;
}

/// Runs every cell on the calling thread, in order.
pub struct SerialExecutor;

impl Executor for SerialExecutor {
    fn run<F>(&self, cells: &[u64], task: F) -> Vec<CellOutcome>
    where
        F: Fn(u64) -> Result<CellAccumulator, Error> + Sync,
    {
        let progress = Progress::new(cells.len());
        cells
            .iter()
            .map(|&cell| {
                let result = task(cell);
                progress.tick();
                CellOutcome { cell, result }
            })
            .collect()
    }
}

/// Runs cells on a fixed-size rayon thread pool.
///
/// Each worker runs one cell to completion before taking the next; nothing
/// suspends cooperatively and a dispatched run cannot be cancelled.
pub struct ThreadPoolExecutor {
    pool: rayon::ThreadPool,
}

impl ThreadPoolExecutor {
    pub fn new(worker_count: usize) -> Result<Self, Error> {
        if worker_count == 0 {
            return Err(Error::config("worker_count", "must be at least 1"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build()
            .map_err(|err| Error::worker_pool(err.to_string()))?;
        Ok(Self { pool })
    }
}

impl Executor for ThreadPoolExecutor {
    fn run<F>(&self, cells: &[u64], task: F) -> Vec<CellOutcome>
    where
        F: Fn(u64) -> Result<CellAccumulator, Error> + Sync,
    {
        let progress = Progress::new(cells.len());
        self.pool.install(|| {
            cells
                .par_iter()
                .map(|&cell| {
                    let result = task(cell);
                    progress.tick();
                    CellOutcome { cell, result }
                })
                .collect()
        })
    }
}
