//! Coarse equal-area sky partitioning (RING-scheme HEALPix).
//!
//! Each delta record is assigned to the HEALPix cell containing its sky
//! coordinates. The cell is the unit of parallel work: all pair finding
//! happens within one cell at a time, so the cell map is what gets fanned
//! out across the worker pool.

use crate::delta::DeltaRecord;
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI};

/// RING-scheme HEALPix pixel index for colatitude `theta` and longitude
/// `phi` (radians).
///
/// This is the standard ang2pix_ring construction: rings of `4*nside` pixels
/// in the equatorial belt (`|cos theta| <= 2/3`) and shrinking rings in the
/// polar caps. Any `nside >= 1` is valid in the RING scheme.
pub fn ang2pix_ring(nside: u32, theta: f64, phi: f64) -> u64 {
    let nside = i64::from(nside);
    let npix = 12 * nside * nside;
    let ncap = 2 * nside * (nside - 1);

    let z = theta.cos();
    let za = z.abs();
    // azimuth rescaled to [0, 4)
    let tt = phi.rem_euclid(2.0 * PI) * 2.0 / PI;

    if za <= 2.0 / 3.0 {
        // equatorial belt: locate the pixel from the two diagonal edge lines
        let temp1 = nside as f64 * (0.5 + tt);
        let temp2 = nside as f64 * (z * 0.75);
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;

        // ring number counted from z = 2/3 and phi index in the ring
        let ring = nside + 1 + jp - jm;
        let kshift = 1 - (ring & 1);
        let in_ring = ((jp + jm - nside + kshift + 1) / 2).rem_euclid(4 * nside);

        (ncap + (ring - 1) * 4 * nside + in_ring) as u64
    } else {
        // polar caps
        let tp = tt.fract();
        let tmp = nside as f64 * (3.0 * (1.0 - za)).sqrt();
        let jp = (tp * tmp) as i64;
        let jm = ((1.0 - tp) * tmp) as i64;

        let ring = jp + jm + 1;
        let in_ring = ((tt * ring as f64) as i64).rem_euclid(4 * ring);

        if z > 0.0 {
            (2 * ring * (ring - 1) + in_ring) as u64
        } else {
            (npix - 2 * ring * (ring + 1) + in_ring) as u64
        }
    }
}

/// Cell index for equatorial sky coordinates (radians).
pub fn cell_of(nside: u32, ra: f64, dec: f64) -> u64 {
    ang2pix_ring(nside, FRAC_PI_2 - dec, ra)
}

/// Delta records grouped by HEALPix cell.
///
/// The map owns its records exclusively; workers only ever borrow them. A
/// `BTreeMap` keeps the cell keys sorted so that cell iteration order (and
/// with it, single-threaded output) is deterministic.
pub struct PixelMap {
    nside: u32,
    cells: BTreeMap<u64, Vec<DeltaRecord>>,
    n_records: usize,
}

impl PixelMap {
    /// Group records by sky cell at the given resolution.
    ///
    /// When `max_objects` is set, only the first `max_objects` records (in
    /// input order) are kept; the cap exists for sampling and tests.
    pub fn partition(
        records: Vec<DeltaRecord>,
        nside: u32,
        max_objects: Option<usize>,
    ) -> Self {
        let mut cells: BTreeMap<u64, Vec<DeltaRecord>> = BTreeMap::new();
        let mut n_records = 0;

        let cap = max_objects.unwrap_or(usize::MAX);
        for record in records.into_iter().take(cap) {
            let cell = cell_of(nside, record.ra(), record.dec());
            cells.entry(cell).or_default().push(record);
            n_records += 1;
        }

        Self {
            nside,
            cells,
            n_records,
        }
    }

    pub fn nside(&self) -> u32 {
        self.nside
    }

    /// Records assigned to one cell (empty when the cell is unoccupied).
    pub fn get(&self, cell: u64) -> &[DeltaRecord] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sorted occupied cell ids.
    pub fn cells(&self) -> impl Iterator<Item = u64> + '_ {
        self.cells.keys().copied()
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }
}

/// The sorted list of cells the reduction will visit.
///
/// For an auto-correlation this is every occupied cell of the single map.
/// For a cross-correlation only cells occupied in both maps can contribute
/// pairs, so the intersection is taken (it may be empty, which yields an
/// all-zero result rather than a failure).
pub fn processed_cells(first: &PixelMap, second: Option<&PixelMap>) -> Vec<u64> {
    match second {
        None => first.cells().collect(),
        Some(second) => first
            .cells()
            .filter(|cell| !second.get(*cell).is_empty())
            .collect(),
    }
}
