//! The per-object delta field consumed by the pair accumulator.

use crate::error::Error;

/// One object's delta field: normalized flux fluctuations on the
/// observed-wavelength grid, with an inverse-variance weight per sample.
///
/// The three sample arrays are index-aligned; the constructor rejects
/// mismatched lengths. Records are transformed (if at all) right after
/// construction via the consuming builder methods and are read-only once
/// they have been handed to the pixel partitioner, so workers can share
/// them freely.
#[derive(Clone, Debug)]
pub struct DeltaRecord {
    id: i64,
    ra: f64,
    dec: f64,
    z: f64,
    log_lambda: Vec<f64>,
    delta: Vec<f64>,
    weight: Vec<f64>,
    z_evol: f64,
}

impl DeltaRecord {
    /// Create a record from aligned (log-wavelength, delta, weight) samples.
    ///
    /// `ra` and `dec` are in radians; `z` is the redshift of the backing
    /// object. The redshift-evolution exponent defaults to 1 (no evolution)
    /// and is normally overridden from the configuration via
    /// [`DeltaRecord::with_z_evol`].
    pub fn new(
        id: i64,
        ra: f64,
        dec: f64,
        z: f64,
        log_lambda: Vec<f64>,
        delta: Vec<f64>,
        weight: Vec<f64>,
    ) -> Result<Self, Error> {
        if delta.len() != log_lambda.len() {
            Err(Error::record_shape(
                id,
                "delta must have the same length as log_lambda",
            ))
        } else if weight.len() != log_lambda.len() {
            Err(Error::record_shape(
                id,
                "weight must have the same length as log_lambda",
            ))
        } else if weight.iter().any(|&w| w < 0.0 || !w.is_finite()) {
            Err(Error::record_shape(
                id,
                "weights must be finite and non-negative",
            ))
        } else {
            Ok(Self {
                id,
                ra,
                dec,
                z,
                log_lambda,
                delta,
                weight,
                z_evol: 1.0,
            })
        }
    }

    /// Override the redshift-evolution exponent.
    pub fn with_z_evol(mut self, z_evol: f64) -> Self {
        self.z_evol = z_evol;
        self
    }

    /// Apply the redshift-evolution reweighting.
    ///
    /// Each sample's weight is scaled by
    /// `((1 + z_abs) / (1 + z_ref))^(z_evol - 1)`, where `z_abs` is the
    /// absorber redshift of that sample for the given rest-frame transition,
    /// `10^log_lambda / lambda_abs - 1`.
    pub fn reweighted(mut self, lambda_abs: f64, z_ref: f64) -> Self {
        let exponent = self.z_evol - 1.0;
        for (w, &ll) in self.weight.iter_mut().zip(self.log_lambda.iter()) {
            let z_abs = 10.0_f64.powf(ll) / lambda_abs - 1.0;
            *w *= ((1.0 + z_abs) / (1.0 + z_ref)).powf(exponent);
        }
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn ra(&self) -> f64 {
        self.ra
    }

    pub fn dec(&self) -> f64 {
        self.dec
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn z_evol(&self) -> f64 {
        self.z_evol
    }

    pub fn log_lambda(&self) -> &[f64] {
        &self.log_lambda
    }

    pub fn delta(&self) -> &[f64] {
        &self.delta
    }

    pub fn weight(&self) -> &[f64] {
        &self.weight
    }

    /// Number of usable samples in the forest.
    pub fn len(&self) -> usize {
        self.log_lambda.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_lambda.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LYA_WAVELENGTH;

    fn sample_record() -> DeltaRecord {
        let llmin = 3600.0_f64.log10();
        DeltaRecord::new(
            7,
            0.1,
            -0.2,
            2.3,
            vec![llmin, llmin + 3.0e-4],
            vec![0.5, -0.5],
            vec![1.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn rejects_misaligned_samples() {
        assert!(DeltaRecord::new(1, 0.0, 0.0, 2.0, vec![3.56], vec![], vec![1.0]).is_err());
        assert!(DeltaRecord::new(1, 0.0, 0.0, 2.0, vec![3.56], vec![0.1], vec![]).is_err());
        assert!(DeltaRecord::new(1, 0.0, 0.0, 2.0, vec![3.56], vec![0.1], vec![-1.0]).is_err());
        assert!(
            DeltaRecord::new(1, 0.0, 0.0, 2.0, vec![3.56], vec![0.1], vec![f64::NAN]).is_err()
        );
    }

    #[test]
    fn unit_exponent_leaves_weights_unchanged() {
        let record = sample_record().reweighted(LYA_WAVELENGTH, 2.25);
        assert_eq!(record.weight(), &[1.0, 2.0]);
    }

    #[test]
    fn reweighting_scales_by_absorber_redshift() {
        let record = sample_record()
            .with_z_evol(2.0)
            .reweighted(LYA_WAVELENGTH, 2.25);

        for (k, (&w, &ll)) in record
            .weight()
            .iter()
            .zip(record.log_lambda().iter())
            .enumerate()
        {
            let z_abs = 10.0_f64.powf(ll) / LYA_WAVELENGTH - 1.0;
            let expected = (k as f64 + 1.0) * ((1.0 + z_abs) / 3.25);
            assert!((w - expected).abs() < 1.0e-12);
        }
    }
}
