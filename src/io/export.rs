//! Export lookup results to CSV.
//!
//! One row per result, flat columns, meant for spreadsheets or downstream scripts.
//! Absent values are written as empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{DistanceLookupResult, LookupResult, SedBestMatch};
use crate::error::AppError;

const LOOKUP_HEADER: [&str; 11] = [
    "color", "observed", "spt", "teff", "rsun", "msun", "logg", "age", "nearest", "gap", "spt_num",
];
const DISTANCE_HEADER: [&str; 5] = ["band", "observed", "spt", "distance_pc", "distance_err_pc"];
const SED_HEADER: [&str; 6] = [
    "rank", "spt", "median_diff_mag", "mean_diff_mag", "bands", "outliers",
];

/// Write bracket lookup results to a CSV file.
pub fn write_lookup_csv(path: &Path, results: &[LookupResult]) -> Result<(), AppError> {
    write_lookup(create(path)?, results)
}

/// Write per-band distances to a CSV file.
pub fn write_distance_csv(path: &Path, results: &[DistanceLookupResult]) -> Result<(), AppError> {
    write_distances(create(path)?, results)
}

/// Write ranked SED matches to a CSV file.
pub fn write_sed_csv(path: &Path, matches: &[SedBestMatch]) -> Result<(), AppError> {
    write_matches(create(path)?, matches)
}

pub fn write_lookup<W: Write>(sink: W, results: &[LookupResult]) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(sink);
    w.write_record(LOOKUP_HEADER).map_err(write_err)?;
    for r in results {
        w.write_record([
            r.color_key.key().to_string(),
            format!("{:.4}", r.color_value),
            r.spt.clone(),
            opt(r.teff.map(|t| t.to_string())),
            opt(r.rsun.map(|v| format!("{v:.4}"))),
            opt(r.msun.map(|v| format!("{v:.4}"))),
            opt(r.log_g.map(|v| format!("{v:.2}"))),
            opt(r.age.clone()),
            format!("{:.4}", r.nearest),
            format!("{:.4}", r.gap),
            opt(r.spt_num.map(|v| format!("{v:.1}"))),
        ])
        .map_err(write_err)?;
    }
    w.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))
}

pub fn write_distances<W: Write>(sink: W, results: &[DistanceLookupResult]) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(sink);
    w.write_record(DISTANCE_HEADER).map_err(write_err)?;
    for r in results {
        w.write_record([
            r.band.key().to_string(),
            format!("{:.4}", r.band_value),
            r.spt.clone(),
            format!("{:.3}", r.distance),
            opt(r.distance_error.map(|v| format!("{v:.3}"))),
        ])
        .map_err(write_err)?;
    }
    w.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))
}

pub fn write_matches<W: Write>(sink: W, matches: &[SedBestMatch]) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(sink);
    w.write_record(SED_HEADER).map_err(write_err)?;
    for (rank, m) in matches.iter().enumerate() {
        w.write_record([
            (rank + 1).to_string(),
            m.spt.clone(),
            format!("{:.4}", m.median_diff_mag),
            format!("{:.4}", m.mean_diff_mag),
            m.bands.to_string(),
            m.outliers.to_string(),
        ])
        .map_err(write_err)?;
    }
    w.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_err(e: csv::Error) -> AppError {
    AppError::input(format!("Failed to write export CSV row: {e}"))
}

fn opt(v: Option<String>) -> String {
    v.unwrap_or_default()
}
