//! The global reduction: summing per-cell accumulators and deriving the 2D
//! and 1D correlation products.
//!
//! Every step is a pure transformation. Divisions are only ever performed
//! where the divisor is strictly positive; entries with no accumulated
//! weight keep their zero initialization.

use crate::accumulate::CellAccumulator;
use crate::grid::SpectralGrid;
use crate::reduce::CellOutcome;
use ndarray::{Array1, Array2};
use serde::Serialize;

/// The dense `num_pixels x num_pixels` correlation products.
///
/// `da` is the weight-normalized covariance of bin pairs, `we` the summed
/// weight and `nb` the pair count. Flat index `bin_i + num_pixels * bin_j`
/// becomes entry `(bin_j, bin_i)`; in auto mode the grids are symmetric by
/// construction so the orientation is immaterial.
#[derive(Debug, Serialize)]
pub struct Correlation2d {
    #[serde(rename = "DA")]
    pub da: Array2<f64>,
    #[serde(rename = "WE")]
    pub we: Array2<f64>,
    #[serde(rename = "NB")]
    pub nb: Array2<u64>,
}

/// The 1D products: the diagonal (variance) vectors and the radially-binned
/// correlation, all of length `num_pixels`.
#[derive(Debug, Serialize)]
pub struct Correlation1d {
    /// variance per bin (diagonal of `da`)
    pub v1d: Array1<f64>,
    /// summed weight per diagonal bin
    pub wv1d: Array1<f64>,
    /// pair count per diagonal bin
    pub nv1d: Array1<u64>,
    /// correlation binned by bin-index separation
    pub c1d: Array1<f64>,
    /// summed weight per separation bin
    pub nc1d: Array1<f64>,
    /// pair count per separation bin
    pub nb1d: Array1<u64>,
}

/// Sum the successful per-cell accumulators elementwise.
///
/// Failed cells contribute nothing (the best-effort policy; the caller has
/// already reported them).
pub fn sum_outcomes(outcomes: &[CellOutcome], num_pixels: usize) -> CellAccumulator {
    let mut total = CellAccumulator::new(num_pixels);
    for outcome in outcomes {
        if let Ok(accum) = &outcome.result {
            total.merge(accum);
        }
    }
    total
}

/// Normalize the summed products by the summed weights and reshape to the
/// dense 2D grids.
pub fn normalize_2d(total: &CellAccumulator) -> Correlation2d {
    let n = total.num_pixels();

    let we = Array2::from_shape_vec((n, n), total.weight().to_vec()).unwrap();
    let nb = Array2::from_shape_vec((n, n), total.pairs().to_vec()).unwrap();
    let mut da = Array2::from_shape_vec((n, n), total.product().to_vec()).unwrap();

    for (d, &w) in da.iter_mut().zip(we.iter()) {
        if w > 0.0 {
            *d /= w;
        }
    }

    Correlation2d { da, we, nb }
}

/// Derive the diagonal vectors and the radially-binned 1D correlation.
///
/// The correlation matrix is first normalized by `sqrt(v1d[i] * v1d[j])`
/// (where positive), then averaged with weight `we[i, j]` along diagonals of
/// constant separation `d = j - i` over the upper triangle. This collapse
/// assumes stationarity along the bin-index axis.
pub fn radial_binning(two_d: &Correlation2d) -> Correlation1d {
    let n = two_d.da.nrows();

    let v1d = Array1::from_iter((0..n).map(|i| two_d.da[(i, i)]));
    let wv1d = Array1::from_iter((0..n).map(|i| two_d.we[(i, i)]));
    let nv1d = Array1::from_iter((0..n).map(|i| two_d.nb[(i, i)]));

    let mut cor = two_d.da.clone();
    for i in 0..n {
        for j in 0..n {
            let norm = (v1d[i] * v1d[j]).sqrt();
            if norm > 0.0 {
                cor[(i, j)] /= norm;
            }
        }
    }

    let mut c1d = Array1::<f64>::zeros(n);
    let mut nc1d = Array1::<f64>::zeros(n);
    let mut nb1d = Array1::<u64>::zeros(n);

    for i in 0..n {
        for j in i..n {
            let d = j - i;
            c1d[d] += cor[(i, j)] * two_d.we[(i, j)];
            nc1d[d] += two_d.we[(i, j)];
            nb1d[d] += two_d.nb[(i, j)];
        }
    }
    for d in 0..n {
        if nc1d[d] > 0.0 {
            c1d[d] /= nc1d[d];
        }
    }

    Correlation1d {
        v1d,
        wv1d,
        nv1d,
        c1d,
        nc1d,
        nb1d,
    }
}

/// Run the full global reduction over the collected outcomes.
pub fn bin_correlations(
    outcomes: &[CellOutcome],
    grid: &SpectralGrid,
) -> (Correlation2d, Correlation1d) {
    let total = sum_outcomes(outcomes, grid.num_pixels());
    let two_d = normalize_2d(&total);
    let one_d = radial_binning(&two_d);
    (two_d, one_d)
}
