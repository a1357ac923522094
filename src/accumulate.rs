//! The per-cell pair accumulator.
//!
//! One [`CellAccumulator`] holds the weighted pairwise sums for a single sky
//! cell. The accumulation is a correlation *along* each forest: every
//! (sample, sample) pair of one object contributes to the (bin, bin) entry
//! of a flattened `num_pixels * num_pixels` buffer. Per-cell accumulators
//! are owned by exactly one worker while they are filled and are merged into
//! the global sums afterwards; merging is commutative and associative, so
//! the reduction order never affects the result.

use crate::delta::DeltaRecord;
use crate::error::Error;
use crate::grid::SpectralGrid;

/// Weighted pairwise sums over one sky cell.
///
/// Three flat buffers of length `num_pixels^2`, flattened as
/// `bin_i + num_pixels * bin_j`:
/// - `weight`: sum of `w_i * w_j`
/// - `product`: sum of `(w_i d_i) * (w_j d_j)`
/// - `pairs`: count of pairs with `w_i * w_j > 0`
///
/// Zero-weight samples still participate arithmetically (they contribute
/// zero) so sample indexing never shifts; they are only excluded from the
/// pair count.
#[derive(Clone, Debug)]
pub struct CellAccumulator {
    num_pixels: usize,
    weight: Vec<f64>,
    product: Vec<f64>,
    pairs: Vec<u64>,
}

impl CellAccumulator {
    pub fn new(num_pixels: usize) -> Self {
        let n = num_pixels * num_pixels;
        Self {
            num_pixels,
            weight: vec![0.0; n],
            product: vec![0.0; n],
            pairs: vec![0; n],
        }
    }

    pub fn num_pixels(&self) -> usize {
        self.num_pixels
    }

    pub fn weight(&self) -> &[f64] {
        &self.weight
    }

    pub fn product(&self) -> &[f64] {
        &self.product
    }

    pub fn pairs(&self) -> &[u64] {
        &self.pairs
    }

    fn check_bins(&self, bins: &[i64], record_id: i64) -> Result<(), Error> {
        match bins.iter().find(|&&b| b < 0 || b >= self.num_pixels as i64) {
            Some(&bad) => Err(Error::bin_index(record_id, bad, self.num_pixels)),
            None => Ok(()),
        }
    }

    /// Accumulate every ordered sample pair of one forest (auto mode).
    ///
    /// The full outer product is taken: both orderings of each off-diagonal
    /// pair plus every self-pair. Off-diagonal pairs are therefore double
    /// counted, consistently, and the accumulated grids are symmetric by
    /// construction.
    pub fn consume_forest(
        &mut self,
        record: &DeltaRecord,
        grid: &SpectralGrid,
    ) -> Result<(), Error> {
        let bins = grid.bin_indices(record.log_lambda());
        self.check_bins(&bins, record.id())?;

        let n = self.num_pixels;
        let delta = record.delta();
        let weight = record.weight();

        for (j, &bin_j) in bins.iter().enumerate() {
            let w_j = weight[j];
            let wd_j = w_j * delta[j];
            let row = n * bin_j as usize;
            for (i, &bin_i) in bins.iter().enumerate() {
                let w_i = weight[i];
                let ww = w_i * w_j;
                let idx = row + bin_i as usize;
                self.weight[idx] += ww;
                self.product[idx] += (w_i * delta[i]) * wd_j;
                if ww > 0.0 {
                    self.pairs[idx] += 1;
                }
            }
        }
        Ok(())
    }

    /// Accumulate all sample combinations between two forests of the same
    /// object (cross mode).
    ///
    /// Bins from `first` run along the fast (flattened) axis and bins from
    /// `second` along the slow axis; only this one orientation is recorded.
    pub fn consume_forest_pair(
        &mut self,
        first: &DeltaRecord,
        second: &DeltaRecord,
        grid: &SpectralGrid,
    ) -> Result<(), Error> {
        let bins1 = grid.bin_indices(first.log_lambda());
        self.check_bins(&bins1, first.id())?;
        let bins2 = grid.bin_indices(second.log_lambda());
        self.check_bins(&bins2, second.id())?;

        let n = self.num_pixels;

        for (j, &bin_j) in bins2.iter().enumerate() {
            let w_j = second.weight()[j];
            let wd_j = w_j * second.delta()[j];
            let row = n * bin_j as usize;
            for (i, &bin_i) in bins1.iter().enumerate() {
                let w_i = first.weight()[i];
                let ww = w_i * w_j;
                let idx = row + bin_i as usize;
                self.weight[idx] += ww;
                self.product[idx] += (w_i * first.delta()[i]) * wd_j;
                if ww > 0.0 {
                    self.pairs[idx] += 1;
                }
            }
        }
        Ok(())
    }

    /// Fold another cell's sums into this one.
    pub fn merge(&mut self, other: &CellAccumulator) {
        assert_eq!(self.num_pixels, other.num_pixels);
        for (a, b) in self.weight.iter_mut().zip(other.weight.iter()) {
            *a += b;
        }
        for (a, b) in self.product.iter_mut().zip(other.product.iter()) {
            *a += b;
        }
        for (a, b) in self.pairs.iter_mut().zip(other.pairs.iter()) {
            *a += b;
        }
    }
}

/// Accumulate one cell of an auto-correlation.
///
/// Each record contributes pairs of its own samples; an empty record
/// contributes nothing.
pub fn accumulate_auto_cell(
    records: &[DeltaRecord],
    grid: &SpectralGrid,
) -> Result<CellAccumulator, Error> {
    let mut accum = CellAccumulator::new(grid.num_pixels());
    for record in records {
        accum.consume_forest(record, grid)?;
    }
    Ok(accum)
}

/// Accumulate one cell of a cross-correlation.
///
/// Forests are matched by shared identifier: each record of `first` is
/// paired with every record of `second` carrying the same id (either list
/// may be empty).
pub fn accumulate_cross_cell(
    first: &[DeltaRecord],
    second: &[DeltaRecord],
    grid: &SpectralGrid,
) -> Result<CellAccumulator, Error> {
    let mut accum = CellAccumulator::new(grid.num_pixels());
    for record in first {
        for partner in second.iter().filter(|r| r.id() == record.id()) {
            accum.consume_forest_pair(record, partner, grid)?;
        }
    }
    Ok(accum)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_grid(num_pixels: usize) -> SpectralGrid {
        let llmin = 3600.0_f64.log10();
        let dll = 3.0e-4;
        SpectralGrid::new(llmin, llmin + (num_pixels as f64 - 1.0) * dll, dll).unwrap()
    }

    fn forest(id: i64, grid: &SpectralGrid, delta: Vec<f64>, weight: Vec<f64>) -> DeltaRecord {
        let log_lambda: Vec<f64> = (0..delta.len())
            .map(|k| grid.log_lambda_min() + (k as f64) * grid.delta_log_lambda())
            .collect();
        DeltaRecord::new(id, 0.3, 0.1, 2.4, log_lambda, delta, weight).unwrap()
    }

    #[test]
    fn single_sample_self_pair() {
        let grid = toy_grid(3);
        let record = forest(1, &grid, vec![0.5], vec![2.0]);

        let accum = accumulate_auto_cell(&[record], &grid).unwrap();
        assert_eq!(accum.weight()[0], 4.0);
        assert_eq!(accum.product()[0], 1.0); // (2*0.5)^2
        assert_eq!(accum.pairs()[0], 1);
        assert!(accum.weight()[1..].iter().all(|&w| w == 0.0));
        assert!(accum.pairs()[1..].iter().all(|&p| p == 0));
    }

    #[test]
    fn forest_outer_product_is_symmetric() {
        let grid = toy_grid(3);
        let record = forest(1, &grid, vec![1.0, -1.0, 1.0], vec![1.0, 2.0, 3.0]);
        let accum = accumulate_auto_cell(&[record], &grid).unwrap();

        let n = grid.num_pixels();
        for j in 0..n {
            for i in 0..n {
                assert_eq!(accum.weight()[i + n * j], accum.weight()[j + n * i]);
                assert_eq!(accum.product()[i + n * j], accum.product()[j + n * i]);
                assert_eq!(accum.pairs()[i + n * j], accum.pairs()[j + n * i]);
            }
        }
        // the (bin 1, bin 0) entry sees exactly one ordered pair: w1*w0 = 2
        assert_eq!(accum.weight()[1], 2.0);
        assert_eq!(accum.product()[1], -2.0);
        assert_eq!(accum.pairs()[1], 1);
    }

    #[test]
    fn zero_weight_samples_contribute_nothing_but_keep_alignment() {
        let grid = toy_grid(3);
        let record = forest(1, &grid, vec![1.0, 5.0, 1.0], vec![1.0, 0.0, 1.0]);
        let accum = accumulate_auto_cell(&[record], &grid).unwrap();

        let n = grid.num_pixels();
        // pairs involving the zero-weight middle sample
        assert_eq!(accum.weight()[1], 0.0);
        assert_eq!(accum.product()[1], 0.0);
        assert_eq!(accum.pairs()[1], 0);
        assert_eq!(accum.pairs()[1 + n], 0); // the (1,1) self pair
        // the surviving corner pair is untouched
        assert_eq!(accum.weight()[2], 1.0);
        assert_eq!(accum.product()[2], 1.0);
        assert_eq!(accum.pairs()[2], 1);
    }

    #[test]
    fn out_of_range_sample_is_an_error() {
        let grid = toy_grid(3);
        let far = grid.log_lambda_min() + 10.0 * grid.delta_log_lambda();
        let record =
            DeltaRecord::new(9, 0.0, 0.0, 2.0, vec![far], vec![1.0], vec![1.0]).unwrap();
        assert!(accumulate_auto_cell(&[record], &grid).is_err());
    }

    #[test]
    fn sample_below_the_grid_is_an_error() {
        let grid = toy_grid(3);
        let low = grid.log_lambda_min() - 10.0 * grid.delta_log_lambda();
        let record =
            DeltaRecord::new(9, 0.0, 0.0, 2.0, vec![low], vec![100.0], vec![1.0]).unwrap();

        // must take the error path, not alias into bin 0
        let result = accumulate_auto_cell(&[record], &grid);
        assert!(result.is_err());
    }

    #[test]
    fn cross_pairs_match_by_id() {
        let grid = toy_grid(3);
        let a = forest(1, &grid, vec![1.0, 1.0], vec![1.0, 1.0]);
        let b = forest(1, &grid, vec![1.0, -1.0], vec![1.0, 1.0]);
        let unmatched = forest(2, &grid, vec![9.0, 9.0], vec![1.0, 1.0]);

        let accum = accumulate_cross_cell(&[a], &[b, unmatched], &grid).unwrap();

        let n = grid.num_pixels();
        // 2x2 sample combinations of the matched pair, nothing else
        assert_eq!(accum.pairs().iter().sum::<u64>(), 4);
        assert_eq!(accum.product()[0], 1.0); // d_a[0]*d_b[0]
        assert_eq!(accum.product()[1 + n], -1.0); // d_a[1]*d_b[1]
        assert_eq!(accum.weight()[1], 1.0);
    }

    #[test]
    fn merge_adds_elementwise() {
        let grid = toy_grid(2);
        let a = forest(1, &grid, vec![1.0, 1.0], vec![1.0, 1.0]);
        let b = forest(2, &grid, vec![2.0, -2.0], vec![1.0, 1.0]);

        let lhs = accumulate_auto_cell(&[a.clone()], &grid).unwrap();
        let rhs = accumulate_auto_cell(&[b.clone()], &grid).unwrap();
        let both = accumulate_auto_cell(&[a, b], &grid).unwrap();

        let mut merged = lhs.clone();
        merged.merge(&rhs);
        assert_eq!(merged.weight(), both.weight());
        assert_eq!(merged.product(), both.product());
        assert_eq!(merged.pairs(), both.pairs());
    }
}
