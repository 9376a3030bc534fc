//! Shared lookup pipeline used by the CLI commands.
//!
//! `load_configured_grid` reads the grid a command needs; each `run_*`
//! function takes that grid as an argument, runs the core lookup and returns
//! typed results. Printing and exporting stay in `app`, so the whole workflow
//! is testable without spawning the binary or touching the filesystem.

use std::collections::BTreeMap;

use tracing::info;

use crate::domain::{
    Band, ColorIndex, DistanceLookupResult, LookupConfig, LookupResult, ReferenceGrid,
    SedBestMatch,
};
use crate::error::AppError;
use crate::io::load_grid_from_dir;
use crate::lookup;
use crate::sed::{MatchOptions, align_template, match_templates};

/// Outputs of an `spt sed` run.
#[derive(Debug, Clone)]
pub struct SedRun {
    pub matches: Vec<SedBestMatch>,
    /// Magnitudes of the best template on the observed scale (native with `overplot`).
    pub aligned_best: Option<BTreeMap<Band, f64>>,
}

/// Load the grid selected by `config`.
pub fn load_configured_grid(config: &LookupConfig) -> Result<ReferenceGrid, AppError> {
    let loaded = load_grid_from_dir(&config.grid_dir, config.grid)?;
    if !loaded.row_errors.is_empty() {
        info!(
            skipped = loaded.row_errors.len(),
            grid = config.grid.display_name(),
            "some grid rows were skipped"
        );
    }
    Ok(loaded.grid)
}

/// Bracket lookup of observed colors against `grid`.
pub fn run_lookup(grid: &ReferenceGrid, colors: &BTreeMap<ColorIndex, f64>) -> Vec<LookupResult> {
    let results = lookup::lookup(colors, grid);
    info!(results = results.len(), "lookup complete");
    results
}

/// Cooling-track Teff lookup, optionally pinned to the track nearest `log_g`.
pub fn run_teff(
    grid: &ReferenceGrid,
    colors: &BTreeMap<ColorIndex, f64>,
    log_g: Option<f64>,
) -> Vec<LookupResult> {
    let results = lookup::lookup_teff(colors, grid, log_g);
    info!(results = results.len(), log_g = ?log_g, "teff lookup complete");
    results
}

/// Per-band photometric distances for a known spectral type.
pub fn run_distance(
    grid: &ReferenceGrid,
    spt: &str,
    apparent: &BTreeMap<Band, f64>,
    errors: &BTreeMap<Band, f64>,
) -> Vec<DistanceLookupResult> {
    let results = lookup::lookup_with_errors(spt, apparent, errors, grid);
    info!(spt, results = results.len(), "distance lookup complete");
    results
}

/// Median-offset SED matching against the templates in `grid`.
pub fn run_sed(
    grid: &ReferenceGrid,
    observed: &BTreeMap<Band, f64>,
    opts: &MatchOptions,
    overplot: bool,
) -> Result<SedRun, AppError> {
    let matches = match_templates(observed, grid.entries(), opts)?;

    let aligned_best = matches.first().and_then(|best| {
        grid.find_by_label(&best.spt)
            .map(|template| align_template(template, best, overplot))
    });

    info!(matches = matches.len(), "SED matching complete");
    Ok(SedRun {
        matches,
        aligned_best,
    })
}
