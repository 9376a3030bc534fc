//! Photometric distances from the distance modulus.
//!
//! `d = 10^((m - M + 5) / 5)` parsecs, with `m` the observed apparent magnitude
//! and `M` the reference absolute magnitude for the star's spectral type.

use std::collections::BTreeMap;
use std::f64::consts::LN_10;

use tracing::debug;

use crate::domain::{Band, DistanceLookupResult, ReferenceGrid, is_measured};

/// Distance in parsecs for apparent magnitude `m` and absolute magnitude `abs_mag`.
pub fn distance_from_modulus(m: f64, abs_mag: f64) -> f64 {
    10f64.powf((m - abs_mag + 5.0) / 5.0)
}

/// One distance per band with both an observed and a reference magnitude.
///
/// Returns an empty list when `spt` is not in the grid. Bands with a missing
/// value on either side are skipped silently.
pub fn lookup(
    spt: &str,
    apparent: &BTreeMap<Band, f64>,
    grid: &ReferenceGrid,
) -> Vec<DistanceLookupResult> {
    lookup_with_errors(spt, apparent, &BTreeMap::new(), grid)
}

/// Like [`lookup`], propagating magnitude errors into `distance_error`.
///
/// `σd = d · ln(10)/5 · sqrt(σm² + σM²)`, using the caller's error for `m`
/// and the grid's error for `M` where present.
pub fn lookup_with_errors(
    spt: &str,
    apparent: &BTreeMap<Band, f64>,
    errors: &BTreeMap<Band, f64>,
    grid: &ReferenceGrid,
) -> Vec<DistanceLookupResult> {
    let Some(entry) = grid.find_by_label(spt) else {
        debug!(spt, grid = grid.kind().display_name(), "spectral type not in grid");
        return Vec::new();
    };

    let mut out = Vec::new();
    for (&band, &m) in apparent {
        if !is_measured(m) {
            continue;
        }
        let Some(abs_mag) = entry.magnitude(band) else {
            continue;
        };

        let distance = distance_from_modulus(m, abs_mag);
        let sigma_m = errors.get(&band).copied().filter(|&e| is_measured(e));
        let sigma_abs = entry.error(band);
        let distance_error = match (sigma_m, sigma_abs) {
            (None, None) => None,
            (a, b) => {
                let var = a.unwrap_or(0.0).powi(2) + b.unwrap_or(0.0).powi(2);
                Some(distance * LN_10 / 5.0 * var.sqrt())
            }
        };

        out.push(DistanceLookupResult {
            band,
            band_value: m,
            spt: entry.label.clone(),
            distance,
            distance_error,
        });
    }
    out
}
