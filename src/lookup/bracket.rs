//! Bracket interpolation of observed colors against a reference grid.
//!
//! Grids are walked one track at a time (contiguous rows sharing `log_g`; a
//! grid without surface gravities is a single track). For every adjacent pair
//! of entries in a track and every observed color index:
//!
//! 1. skip the pair if either reference value or the observation is missing (`0.0`)
//! 2. order the pair so `min <= max` (grids may run either way per color)
//! 3. snap the observation to `min` when it lies in `[min, avg)` and to `max`
//!    when it lies in `[avg, max]`; anything outside `[min, max]` yields nothing
//!
//! Overlapping brackets can produce the same result twice (an observation equal
//! to a grid value is hit by both neighbouring pairs), so results are
//! de-duplicated structurally while keeping first-seen order.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::domain::{
    ColorIndex, LookupResult, ReferenceEntry, ReferenceGrid, bracket_pairs, is_measured,
};

/// Infer spectral type and physical parameters from observed colors.
pub fn lookup(observed: &BTreeMap<ColorIndex, f64>, grid: &ReferenceGrid) -> Vec<LookupResult> {
    let tracks = grid.tracks();
    let results = scan_tracks(observed, &tracks);
    debug!(
        grid = grid.kind().display_name(),
        tracks = tracks.len(),
        colors = observed.len(),
        results = results.len(),
        "bracket lookup finished"
    );
    results
}

/// Bracket lookup over a Teff-ordered grid made of cooling tracks.
///
/// Each track (contiguous rows sharing `log_g`) is walked on its own so a
/// bracket never spans two tracks. With `log_g` set, only the track nearest to
/// that surface gravity is used.
pub fn lookup_teff(
    observed: &BTreeMap<ColorIndex, f64>,
    grid: &ReferenceGrid,
    log_g: Option<f64>,
) -> Vec<LookupResult> {
    let tracks = grid.tracks();
    let selected = match log_g {
        Some(target) => match nearest_track(&tracks, target) {
            Some(track) => vec![track],
            None => {
                warn!(log_g = target, "grid has no log g tracks; using every row");
                tracks
            }
        },
        None => tracks,
    };

    let results = scan_tracks(observed, &selected);
    debug!(
        tracks = selected.len(),
        colors = observed.len(),
        results = results.len(),
        "teff lookup finished"
    );
    results
}

/// Classify one observation against one bracket. `None` means "no result".
pub fn classify(
    key: ColorIndex,
    observed: f64,
    min_entry: &ReferenceEntry,
    max_entry: &ReferenceEntry,
) -> Option<LookupResult> {
    if !is_measured(observed) {
        return None;
    }
    let mut min_value = min_entry.color(key)?;
    let mut max_value = max_entry.color(key)?;
    let (mut low, mut high) = (min_entry, max_entry);

    if min_value > max_value {
        std::mem::swap(&mut min_value, &mut max_value);
        std::mem::swap(&mut low, &mut high);
    }

    let avg = (min_value + max_value) / 2.0;
    let (entry, nearest) = if observed >= min_value && observed < avg {
        (low, min_value)
    } else if observed >= avg && observed <= max_value {
        (high, max_value)
    } else {
        return None;
    };

    Some(LookupResult::from_entry(key, observed, entry, nearest))
}

fn scan_tracks(
    observed: &BTreeMap<ColorIndex, f64>,
    tracks: &[&[ReferenceEntry]],
) -> Vec<LookupResult> {
    let mut results = Vec::new();
    for track in tracks {
        results.extend(scan(observed, track));
    }
    dedup(results)
}

fn scan(observed: &BTreeMap<ColorIndex, f64>, entries: &[ReferenceEntry]) -> Vec<LookupResult> {
    let mut out = Vec::new();
    for (min_entry, max_entry) in bracket_pairs(entries) {
        for (&key, &value) in observed {
            if let Some(result) = classify(key, value, min_entry, max_entry) {
                out.push(result);
            }
        }
    }
    out
}

fn dedup(results: Vec<LookupResult>) -> Vec<LookupResult> {
    let mut out: Vec<LookupResult> = Vec::with_capacity(results.len());
    for result in results {
        if !out.contains(&result) {
            out.push(result);
        }
    }
    out
}

fn nearest_track<'a>(tracks: &[&'a [ReferenceEntry]], target: f64) -> Option<&'a [ReferenceEntry]> {
    tracks
        .iter()
        .filter_map(|track| {
            let log_g = track.first()?.log_g?;
            Some((*track, (log_g - target).abs()))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(track, _)| track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GridKind;

    fn entry(label: &str, teff: u32, colors: &[(ColorIndex, f64)]) -> ReferenceEntry {
        ReferenceEntry {
            label: label.to_string(),
            teff: Some(teff),
            colors: colors.iter().copied().collect(),
            ..ReferenceEntry::default()
        }
    }

    fn observed(values: &[(ColorIndex, f64)]) -> BTreeMap<ColorIndex, f64> {
        values.iter().copied().collect()
    }

    fn two_row_grid(min: f64, max: f64) -> ReferenceGrid {
        ReferenceGrid::new(
            GridKind::MainSequence,
            vec![
                entry("M5.5V", 3000, &[(ColorIndex::BV, min)]),
                entry("M6V", 2850, &[(ColorIndex::BV, max)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn midpoint_goes_to_max_bracket() {
        let grid = two_row_grid(1.91, 1.95);
        let results = lookup(&observed(&[(ColorIndex::BV, 1.93)]), &grid);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].spt, "M6V");
        assert_eq!(results[0].nearest, 1.95);
    }

    #[test]
    fn below_midpoint_goes_to_min_bracket() {
        let grid = two_row_grid(1.91, 2.05);
        let results = lookup(&observed(&[(ColorIndex::BV, 1.95)]), &grid);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.spt, "M5.5V");
        assert_eq!(r.teff, Some(3000));
        assert_eq!(r.nearest, 1.91);
        assert!((r.gap - 0.04).abs() < 1e-9);
        assert_eq!(r.spt_num, Some(65.5));
    }

    #[test]
    fn descending_values_are_swapped() {
        // Grid runs hot-to-cool in Teff but this color decreases along it.
        let grid = two_row_grid(2.05, 1.91);
        let results = lookup(&observed(&[(ColorIndex::BV, 2.0)]), &grid);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].spt, "M5.5V");
        assert_eq!(results[0].nearest, 2.05);
    }

    #[test]
    fn outside_bracket_yields_nothing() {
        let grid = two_row_grid(1.91, 1.95);
        assert!(lookup(&observed(&[(ColorIndex::BV, 1.96)]), &grid).is_empty());
        assert!(lookup(&observed(&[(ColorIndex::BV, 1.80)]), &grid).is_empty());
    }

    #[test]
    fn zero_sentinel_excludes_pair() {
        let grid = ReferenceGrid::new(
            GridKind::MainSequence,
            vec![
                entry("A", 1, &[(ColorIndex::JH, 0.0)]),
                entry("B", 2, &[(ColorIndex::JH, 0.02)]),
            ],
        )
        .unwrap();
        // 0.001 sits inside [0.0, 0.02] numerically, but 0.0 means "not measured".
        assert!(lookup(&observed(&[(ColorIndex::JH, 0.001)]), &grid).is_empty());
        // An observed zero is also treated as missing.
        assert!(lookup(&observed(&[(ColorIndex::JH, 0.0)]), &grid).is_empty());
    }

    #[test]
    fn missing_key_in_grid_yields_nothing() {
        let grid = two_row_grid(1.91, 1.95);
        assert!(lookup(&observed(&[(ColorIndex::JH, 0.6)]), &grid).is_empty());
        assert!(lookup(&BTreeMap::new(), &grid).is_empty());
    }

    #[test]
    fn exact_grid_value_is_reported_once() {
        let grid = ReferenceGrid::new(
            GridKind::MainSequence,
            vec![
                entry("M5V", 3060, &[(ColorIndex::BV, 1.83)]),
                entry("M5.5V", 3000, &[(ColorIndex::BV, 1.91)]),
                entry("M6V", 2850, &[(ColorIndex::BV, 2.05)]),
            ],
        )
        .unwrap();
        let results = lookup(&observed(&[(ColorIndex::BV, 1.91)]), &grid);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].spt, "M5.5V");
        assert_eq!(results[0].gap, 0.0);
    }

    #[test]
    fn first_entry_matches_through_self_pair() {
        let grid = two_row_grid(1.91, 2.05);
        let results = lookup(&observed(&[(ColorIndex::BV, 1.91)]), &grid);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].spt, "M5.5V");
    }

    #[test]
    fn results_stay_inside_their_bracket() {
        let values = [0.40, 0.55, 0.81, 1.02, 1.40, 1.49];
        let grid = ReferenceGrid::new(
            GridKind::MainSequence,
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| entry(&format!("K{i}V"), 5000 - i as u32 * 100, &[(ColorIndex::BV, v)]))
                .collect(),
        )
        .unwrap();

        for step in 0..=120 {
            let obs = 0.35 + step as f64 * 0.01;
            for r in lookup(&observed(&[(ColorIndex::BV, obs)]), &grid) {
                assert!(values.contains(&r.nearest), "nearest {} not in grid", r.nearest);
                assert!(r.gap >= 0.0);
                assert!((r.gap - (obs - r.nearest).abs()).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn repeated_lookups_agree() {
        let grid = two_row_grid(1.91, 2.05);
        let obs = observed(&[(ColorIndex::BV, 1.99), (ColorIndex::JH, 0.6)]);
        let first = lookup(&obs, &grid);
        let second = lookup(&obs, &grid);
        assert_eq!(first.len(), second.len());
        for r in &first {
            assert!(second.contains(r));
        }
    }

    fn wd_entry(teff: u32, log_g: f64, msun: f64, bp_rp: f64) -> ReferenceEntry {
        ReferenceEntry {
            teff: Some(teff),
            log_g: Some(log_g),
            msun: Some(msun),
            age: Some(format!("{:.2e}", 1.0e9 / teff as f64)),
            colors: [(ColorIndex::BpRp, bp_rp)].into_iter().collect(),
            ..ReferenceEntry::default()
        }
    }

    fn wd_grid() -> ReferenceGrid {
        ReferenceGrid::new(
            GridKind::WhiteDwarf,
            vec![
                wd_entry(5000, 7.5, 0.34, 0.90),
                wd_entry(6000, 7.5, 0.34, 0.60),
                wd_entry(8000, 7.5, 0.34, 0.25),
                wd_entry(5000, 8.0, 0.59, 0.95),
                wd_entry(6000, 8.0, 0.59, 0.62),
                wd_entry(8000, 8.0, 0.59, 0.26),
            ],
        )
        .unwrap()
    }

    #[test]
    fn teff_lookup_selects_nearest_track() {
        let results = lookup_teff(&observed(&[(ColorIndex::BpRp, 0.64)]), &wd_grid(), Some(7.9));
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.teff, Some(6000));
        assert_eq!(r.log_g, Some(8.0));
        assert_eq!(r.msun, Some(0.59));
        assert!(r.age.is_some());
    }

    #[test]
    fn teff_brackets_never_cross_tracks() {
        // Walked as one sequence, the 8000 K row of the 7.5 track (0.25) and the
        // 5000 K row of the 8.0 track (0.95) would form a bracket snapping 0.55 to 8000 K.
        let results = lookup_teff(&observed(&[(ColorIndex::BpRp, 0.55)]), &wd_grid(), None);
        assert!(results.iter().all(|r| r.teff == Some(6000)));
        assert_eq!(results.len(), 2);
        let tracks: Vec<Option<f64>> = results.iter().map(|r| r.log_g).collect();
        assert!(tracks.contains(&Some(7.5)));
        assert!(tracks.contains(&Some(8.0)));
    }

    #[test]
    fn color_lookup_never_crosses_tracks() {
        let results = lookup(&observed(&[(ColorIndex::BpRp, 0.55)]), &wd_grid());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.teff == Some(6000)), "{results:?}");
        assert_eq!(results[0].log_g, Some(7.5));
        assert_eq!(results[1].log_g, Some(8.0));
    }

    #[test]
    fn single_track_grid_is_walked_whole() {
        let grid = ReferenceGrid::new(
            GridKind::MainSequence,
            vec![
                entry("M5V", 3060, &[(ColorIndex::BV, 1.83)]),
                entry("M5.5V", 3000, &[(ColorIndex::BV, 1.91)]),
                entry("M6V", 2850, &[(ColorIndex::BV, 2.05)]),
            ],
        )
        .unwrap();
        assert_eq!(grid.tracks().len(), 1);
        let results = lookup(&observed(&[(ColorIndex::BV, 2.0)]), &grid);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].spt, "M6V");
    }
}
