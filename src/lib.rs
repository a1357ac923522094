/*!
Computes the 1D auto- and cross-correlation of delta fields (normalized
flux-fluctuation spectra) binned in observed log-wavelength.

# High-Level: the 1D correlation function

Large spectroscopic surveys extract a "delta field" from each observed
spectrum: the normalized flux fluctuation around a fitted continuum over the
usable wavelength range of the forest. Correlating fluctuation samples at
different wavelengths *along the same line of sight* measures large-scale
structure in one dimension.

The calculation proceeds in stages:
1. each object's samples are mapped to a regular grid in log-wavelength
   ([`SpectralGrid`]);
2. objects are grouped into coarse equal-area sky cells ([`PixelMap`]), the
   unit of parallel work;
3. every cell's pairwise weighted products are accumulated into flattened
   (bin, bin) buffers ([`CellAccumulator`]), one worker per cell at a time
   ([`Executor`]);
4. the per-cell sums are reduced into dense 2D covariance/weight/pair-count
   grids and collapsed into the radially-binned 1D correlation
   ([`bin_correlations`]);
5. the result is serialized as two tables with the grid recorded in the
   header ([`CorrelationOutput`]).

The reduction is commutative and associative, so the result is invariant to
the worker-pool size; per-cell failures are carried as tagged outcomes and
never abort a run.

[`compute_cf1d`] wires the stages together for callers that start from
in-memory [`DeltaRecord`]s (file ingestion is deliberately out of scope).
*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the modules in this package
mod accumulate;
mod binning;
mod config;
pub mod constants;
mod delta;
mod driver;
mod error;
mod grid;
mod healpix;
mod output;
mod reduce;

// pull in symbols that are visible outside of the package
pub use accumulate::{accumulate_auto_cell, accumulate_cross_cell, CellAccumulator};
pub use binning::{
    bin_correlations, normalize_2d, radial_binning, sum_outcomes, Correlation1d, Correlation2d,
};
pub use config::CorrelationConfig;
pub use delta::DeltaRecord;
pub use driver::compute_cf1d;
pub use error::Error;
pub use grid::SpectralGrid;
pub use healpix::{ang2pix_ring, cell_of, processed_cells, PixelMap};
pub use output::{CorrelationOutput, GridHeader};
pub use reduce::{
    count_failures, CellOutcome, Executor, Progress, SerialExecutor, ThreadPoolExecutor,
};
