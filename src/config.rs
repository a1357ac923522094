//! The run configuration: bin grid bounds, absorber choices, partition
//! resolution and worker-pool size.
//!
//! The configuration is validated up front and then passed by shared
//! reference into every stage; nothing reads ambient mutable state.

use crate::constants::absorber_wavelength;
use crate::error::Error;
use crate::grid::SpectralGrid;
use serde::Deserialize;
use std::thread;

/// Options recognized by [`compute_cf1d`](crate::compute_cf1d).
///
/// The defaults match the conventional survey setup: observed wavelengths
/// 3600-5500 Angstrom on a 3e-4 log-wavelength grid, Lyman-alpha deltas at a
/// reference redshift of 2.25 with linear redshift evolution, and nside-16
/// sky cells.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorrelationConfig {
    /// lower limit on observed wavelength [Angstrom]
    pub lambda_min: f64,
    /// upper limit on observed wavelength [Angstrom]
    pub lambda_max: f64,
    /// log-wavelength bin width
    pub delta_log_lambda: f64,
    /// absorption transition defining the redshift of the delta field
    pub lambda_abs: String,
    /// transition for the second delta field; setting this (or providing a
    /// second dataset) selects cross-correlation mode
    pub lambda_abs2: Option<String>,
    /// reference redshift of the evolution reweighting
    pub z_ref: f64,
    /// redshift-evolution exponent of the delta field
    pub z_evol: f64,
    /// redshift-evolution exponent of the second delta field
    pub z_evol2: f64,
    /// HEALPix resolution of the sky partition
    pub nside: u32,
    /// size of the worker pool
    pub worker_count: usize,
    /// optional cap on the number of objects per dataset (sampling/tests)
    pub max_objects: Option<usize>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        let worker_count = thread::available_parallelism()
            .map(|n| (n.get() / 2).max(1))
            .unwrap_or(1);
        Self {
            lambda_min: 3600.0,
            lambda_max: 5500.0,
            delta_log_lambda: 3.0e-4,
            lambda_abs: "LYA".to_string(),
            lambda_abs2: None,
            z_ref: 2.25,
            z_evol: 1.0,
            z_evol2: 1.0,
            nside: 16,
            worker_count,
            max_objects: None,
        }
    }
}

impl CorrelationConfig {
    /// Check every option; malformed configuration is fatal before any
    /// worker is dispatched.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.lambda_min > 0.0) || !self.lambda_min.is_finite() {
            return Err(Error::config("lambda_min", "must be positive and finite"));
        }
        if !(self.lambda_max > self.lambda_min) || !self.lambda_max.is_finite() {
            return Err(Error::config("lambda_max", "must exceed lambda_min"));
        }
        if !(self.delta_log_lambda > 0.0) {
            return Err(Error::config("delta_log_lambda", "must be positive"));
        }
        if self.nside == 0 {
            return Err(Error::config("nside", "must be at least 1"));
        }
        if self.worker_count == 0 {
            return Err(Error::config("worker_count", "must be at least 1"));
        }
        if !(self.z_ref > -1.0) {
            return Err(Error::config("z_ref", "must be greater than -1"));
        }
        self.absorber()?;
        self.absorber2()?;
        Ok(())
    }

    /// The spectral bin grid implied by the wavelength bounds.
    pub fn grid(&self) -> Result<SpectralGrid, Error> {
        SpectralGrid::from_wavelength_bounds(
            self.lambda_min,
            self.lambda_max,
            self.delta_log_lambda,
        )
    }

    /// Rest-frame wavelength of the first dataset's transition.
    pub fn absorber(&self) -> Result<f64, Error> {
        absorber_wavelength(&self.lambda_abs)
            .ok_or_else(|| Error::absorber_name(self.lambda_abs.clone()))
    }

    /// Rest-frame wavelength of the second dataset's transition (falls back
    /// to the first).
    pub fn absorber2(&self) -> Result<f64, Error> {
        match &self.lambda_abs2 {
            Some(name) => {
                absorber_wavelength(name).ok_or_else(|| Error::absorber_name(name.clone()))
            }
            None => self.absorber(),
        }
    }
}
