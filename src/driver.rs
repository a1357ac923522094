//! The end-to-end pipeline: reweight, partition, reduce, bin.

use crate::accumulate::{accumulate_auto_cell, accumulate_cross_cell, CellAccumulator};
use crate::binning::bin_correlations;
use crate::config::CorrelationConfig;
use crate::delta::DeltaRecord;
use crate::error::Error;
use crate::healpix::{processed_cells, PixelMap};
use crate::output::CorrelationOutput;
use crate::reduce::{count_failures, CellOutcome, Executor, SerialExecutor, ThreadPoolExecutor};
use log::{info, warn};

fn prepare(
    records: Vec<DeltaRecord>,
    z_evol: f64,
    lambda_abs: f64,
    z_ref: f64,
    nside: u32,
    max_objects: Option<usize>,
) -> PixelMap {
    let records: Vec<DeltaRecord> = records
        .into_iter()
        .map(|r| r.with_z_evol(z_evol).reweighted(lambda_abs, z_ref))
        .collect();
    PixelMap::partition(records, nside, max_objects)
}

/// Compute the 1D auto- or cross-correlation of the given delta fields.
///
/// With a single dataset and a single absorber this is the auto-correlation
/// along each forest. Cross-correlation mode is selected by providing a
/// second dataset, or by configuring a `lambda_abs2` that differs from
/// `lambda_abs`, in which case the single dataset is paired against itself
/// reweighted for the second transition.
///
/// Per-cell failures are logged and reported in aggregate; they never abort
/// the run. An empty cell intersection in cross mode is surfaced as a
/// warning and yields all-zero output arrays.
pub fn compute_cf1d(
    config: &CorrelationConfig,
    data: Vec<DeltaRecord>,
    data2: Option<Vec<DeltaRecord>>,
) -> Result<CorrelationOutput, Error> {
    config.validate()?;
    let grid = config.grid()?;
    let lambda_abs = config.absorber()?;
    let lambda_abs2 = config.absorber2()?;

    // cross mode against the same records when the second absorber resolves
    // to a different transition; a second absorber naming the same line is
    // plain auto-correlation
    let second_raw = match data2 {
        Some(records) => Some(records),
        None if config.lambda_abs2.is_some() && lambda_abs2 != lambda_abs => Some(data.clone()),
        None => None,
    };

    let first = prepare(
        data,
        config.z_evol,
        lambda_abs,
        config.z_ref,
        config.nside,
        config.max_objects,
    );
    info!(
        "partitioned {} objects into {} sky cells",
        first.n_records(),
        first.n_cells()
    );

    let second = second_raw.map(|records| {
        let map = prepare(
            records,
            config.z_evol2,
            lambda_abs2,
            config.z_ref,
            config.nside,
            config.max_objects,
        );
        info!(
            "partitioned {} objects of the second dataset into {} sky cells",
            map.n_records(),
            map.n_cells()
        );
        map
    });

    let cells = processed_cells(&first, second.as_ref());
    if cells.is_empty() {
        warn!("no sky cell holds objects from both datasets; output will be all zero");
    }

    let task = |cell: u64| -> Result<CellAccumulator, Error> {
        match &second {
            Some(second) => accumulate_cross_cell(first.get(cell), second.get(cell), &grid),
            None => accumulate_auto_cell(first.get(cell), &grid),
        }
    };

    let outcomes: Vec<CellOutcome> = if config.worker_count == 1 {
        SerialExecutor.run(&cells, task)
    } else {
        ThreadPoolExecutor::new(config.worker_count)?.run(&cells, task)
    };

    for outcome in &outcomes {
        if let Err(err) = &outcome.result {
            warn!("cell {} failed: {}", outcome.cell, err);
        }
    }
    let failures = count_failures(&outcomes);
    if failures > 0 {
        warn!(
            "{} of {} cells failed and contribute nothing to the reduction",
            failures,
            cells.len()
        );
    }

    let (two_d, one_d) = bin_correlations(&outcomes, &grid);
    Ok(CorrelationOutput::new(&grid, one_d, two_d))
}
