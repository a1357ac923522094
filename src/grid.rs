//! The observed-wavelength bin grid shared by every stage of the calculation.

use crate::error::Error;

/// Regular grid in log10 of observed wavelength.
///
/// Every delta-field sample is mapped to one of `num_pixels` bins by rounding
/// `(log_lambda - log_lambda_min) / delta_log_lambda` to the nearest integer.
/// The indexing itself performs no bounds filtering: callers must pre-filter
/// samples to the configured observed range, and the pair accumulator treats
/// an out-of-range index as a per-cell failure.
#[derive(Clone, Debug)]
pub struct SpectralGrid {
    log_lambda_min: f64,
    log_lambda_max: f64,
    delta_log_lambda: f64,
    num_pixels: usize,
}

impl SpectralGrid {
    pub fn new(
        log_lambda_min: f64,
        log_lambda_max: f64,
        delta_log_lambda: f64,
    ) -> Result<Self, Error> {
        if !log_lambda_min.is_finite() || !log_lambda_max.is_finite() {
            Err(Error::grid("bounds must be finite"))
        } else if log_lambda_max <= log_lambda_min {
            Err(Error::grid(
                "log_lambda_max must be greater than log_lambda_min",
            ))
        } else if !(delta_log_lambda > 0.0) {
            Err(Error::grid("delta_log_lambda must be positive"))
        } else {
            let num_pixels =
                ((log_lambda_max - log_lambda_min) / delta_log_lambda) as usize + 1;
            Ok(Self {
                log_lambda_min,
                log_lambda_max,
                delta_log_lambda,
                num_pixels,
            })
        }
    }

    /// Build the grid from observed-wavelength bounds in Angstrom.
    pub fn from_wavelength_bounds(
        lambda_min: f64,
        lambda_max: f64,
        delta_log_lambda: f64,
    ) -> Result<Self, Error> {
        if !(lambda_min > 0.0) || !(lambda_max > 0.0) {
            return Err(Error::grid("wavelength bounds must be positive"));
        }
        Self::new(lambda_min.log10(), lambda_max.log10(), delta_log_lambda)
    }

    pub fn log_lambda_min(&self) -> f64 {
        self.log_lambda_min
    }

    pub fn log_lambda_max(&self) -> f64 {
        self.log_lambda_max
    }

    pub fn delta_log_lambda(&self) -> f64 {
        self.delta_log_lambda
    }

    pub fn num_pixels(&self) -> usize {
        self.num_pixels
    }

    /// Bin index of a single log-wavelength sample (round to nearest).
    ///
    /// The index is signed: a sample more than half a bin below
    /// `log_lambda_min` yields a negative index, so callers can reject both
    /// sides of the range symmetrically instead of having low-side samples
    /// alias into bin 0.
    #[inline]
    pub fn bin_index(&self, log_lambda: f64) -> i64 {
        ((log_lambda - self.log_lambda_min) / self.delta_log_lambda + 0.5).floor() as i64
    }

    /// Bin indices for a full forest's log-wavelength samples.
    pub fn bin_indices(&self, log_lambda: &[f64]) -> Vec<i64> {
        log_lambda.iter().map(|&ll| self.bin_index(ll)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_invalid_creation() {
        // max <= min
        assert!(SpectralGrid::new(3.5, 3.5, 3.0e-4).is_err());
        assert!(SpectralGrid::new(3.6, 3.5, 3.0e-4).is_err());

        // non-positive bin width
        assert!(SpectralGrid::new(3.5, 3.6, 0.0).is_err());
        assert!(SpectralGrid::new(3.5, 3.6, -1.0e-4).is_err());

        // non-finite bounds
        assert!(SpectralGrid::new(f64::NAN, 3.6, 3.0e-4).is_err());
        assert!(SpectralGrid::new(3.5, f64::INFINITY, 3.0e-4).is_err());

        // non-positive wavelengths
        assert!(SpectralGrid::from_wavelength_bounds(-3600.0, 5500.0, 3.0e-4).is_err());
    }

    #[test]
    fn num_pixels_formula() {
        let grid = SpectralGrid::from_wavelength_bounds(3600.0, 5500.0, 3.0e-4).unwrap();
        let expected = ((5500.0_f64.log10() - 3600.0_f64.log10()) / 3.0e-4) as usize + 1;
        assert_eq!(grid.num_pixels(), expected);

        // the 3-pixel toy grid used throughout the integration tests
        let llmin = 3600.0_f64.log10();
        let grid = SpectralGrid::new(llmin, llmin + 2.0 * 3.0e-4, 3.0e-4).unwrap();
        assert_eq!(grid.num_pixels(), 3);
    }

    #[test]
    fn bin_index_rounds_to_nearest() {
        let llmin = 3600.0_f64.log10();
        let dll = 3.0e-4;
        let grid = SpectralGrid::new(llmin, llmin + 10.0 * dll, dll).unwrap();

        assert_eq!(grid.bin_index(llmin), 0);
        assert_eq!(grid.bin_index(llmin + dll), 1);
        assert_eq!(grid.bin_index(llmin + 5.0 * dll), 5);

        // samples slightly off the bin centers still round to the center
        assert_eq!(grid.bin_index(llmin + 1.4 * dll), 1);
        assert_eq!(grid.bin_index(llmin + 1.6 * dll), 2);
    }

    #[test]
    fn bin_index_is_negative_below_the_grid() {
        let llmin = 3600.0_f64.log10();
        let dll = 3.0e-4;
        let grid = SpectralGrid::new(llmin, llmin + 10.0 * dll, dll).unwrap();

        // within half a bin of the lower edge still rounds to bin 0
        assert_eq!(grid.bin_index(llmin - 0.4 * dll), 0);
        // anything further below must not fold into bin 0
        assert_eq!(grid.bin_index(llmin - 0.6 * dll), -1);
        assert_eq!(grid.bin_index(llmin - 10.0 * dll), -10);
    }

    #[test]
    fn bin_indices_matches_scalar_version() {
        let llmin = 3600.0_f64.log10();
        let dll = 3.0e-4;
        let grid = SpectralGrid::new(llmin, llmin + 10.0 * dll, dll).unwrap();

        let samples: Vec<f64> = (0..8).map(|i| llmin + (i as f64) * dll).collect();
        let indices = grid.bin_indices(&samples);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
