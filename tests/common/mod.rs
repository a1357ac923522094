// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

use forestcf::{DeltaRecord, SpectralGrid};

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

pub fn assert_allclose(actual: &[f64], reference: &[f64], rtol: f64, atol: f64) {
    assert_eq!(actual.len(), reference.len(), "length mismatch");
    for (i, (&a, &r)) in actual.iter().zip(reference.iter()).enumerate() {
        assert!(
            isclose(a, r, rtol, atol),
            "element {i}: {a} is not close to {r}"
        );
    }
}

/// Build a forest whose k-th sample sits exactly on grid bin `bins[k]`.
pub fn forest_on_grid(
    id: i64,
    ra: f64,
    dec: f64,
    grid: &SpectralGrid,
    bins: &[usize],
    delta: Vec<f64>,
    weight: Vec<f64>,
) -> DeltaRecord {
    let log_lambda: Vec<f64> = bins
        .iter()
        .map(|&b| grid.log_lambda_min() + (b as f64) * grid.delta_log_lambda())
        .collect();
    DeltaRecord::new(id, ra, dec, 2.3, log_lambda, delta, weight).unwrap()
}
