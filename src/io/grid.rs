//! Reference grid CSV loading.
//!
//! This module turns a reference table (one row per spectral type or Teff step)
//! into a `ReferenceGrid`.
//!
//! Design goals:
//! - **Header-driven schema**: column order is free, unknown columns are ignored
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Sentinel normalization**: empty cells and `0` become "absent"
//! - **Separation of concerns**: no lookup logic here

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{Band, ColorIndex, GridKind, ReferenceEntry, ReferenceGrid, is_measured};
use crate::error::AppError;

/// Environment variable naming the directory holding the reference tables.
pub const GRID_DIR_ENV: &str = "STELLAR_GRID_DIR";
const DEFAULT_GRID_DIR: &str = "data";

/// A row-level error encountered during loading.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Load output: the grid plus what was skipped on the way.
#[derive(Debug, Clone)]
pub struct LoadedGrid {
    pub grid: ReferenceGrid,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// What each recognized header maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Label,
    Teff,
    Rsun,
    Msun,
    LogG,
    Age,
    Color(ColorIndex),
    Magnitude(Band),
    Error(Band),
}

/// Resolve the grid directory: explicit flag, then `.env`/environment, then `data`.
pub fn resolve_grid_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    dotenvy::dotenv().ok();
    std::env::var(GRID_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_GRID_DIR))
}

/// Load the table for `kind` from `dir`.
pub fn load_grid_from_dir(dir: &Path, kind: GridKind) -> Result<LoadedGrid, AppError> {
    load_grid(&dir.join(kind.file_name()), kind)
}

/// Load and normalize one grid CSV.
pub fn load_grid(path: &Path, kind: GridKind) -> Result<LoadedGrid, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open grid CSV '{}': {e}", path.display()))
    })?;
    let loaded = read_grid(file, kind)?;
    info!(
        path = %path.display(),
        grid = kind.display_name(),
        rows = loaded.rows_read,
        entries = loaded.grid.len(),
        "reference grid loaded"
    );
    Ok(loaded)
}

/// Parse a grid from any CSV source.
pub fn read_grid<R: Read>(source: R, kind: GridKind) -> Result<LoadedGrid, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read grid CSV headers: {e}")))?
        .clone();
    let columns = build_column_map(&headers);

    if !columns.iter().any(|(_, c)| matches!(c, Column::Label | Column::Teff)) {
        return Err(AppError::input(
            "Grid CSV needs a spectral type (`SpT`) or `Teff` column.",
        ));
    }

    let mut entries = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(entry) => entries.push(entry),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        warn!(line = err.line, "skipped grid row: {}", err.message);
    }

    if entries.len() < 2 {
        return Err(AppError::data(format!(
            "Only {} usable row(s) in the {} grid; at least 2 are required.",
            entries.len(),
            kind.display_name()
        )));
    }

    warn_on_unordered_teff(&entries);

    Ok(LoadedGrid {
        grid: ReferenceGrid::new(kind, entries)?,
        row_errors,
        rows_read,
    })
}

fn build_column_map(headers: &StringRecord) -> Vec<(usize, Column)> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| classify_header(name).map(|c| (idx, c)))
        .collect()
}

fn classify_header(name: &str) -> Option<Column> {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');

    match name.to_ascii_lowercase().as_str() {
        "spt" | "spectral_type" | "label" => return Some(Column::Label),
        "teff" => return Some(Column::Teff),
        "rsun" | "r_rsun" | "radius" => return Some(Column::Rsun),
        "msun" | "mass" => return Some(Column::Msun),
        "logg" | "log_g" => return Some(Column::LogG),
        "age" => return Some(Column::Age),
        _ => {}
    }

    if let Some(band) = name.strip_prefix("M_").and_then(Band::from_key) {
        return Some(Column::Magnitude(band));
    }
    if let Some(band) = name.strip_prefix("e_").and_then(Band::from_key) {
        return Some(Column::Error(band));
    }
    ColorIndex::from_key(name).map(Column::Color)
}

fn parse_row(record: &StringRecord, columns: &[(usize, Column)]) -> Result<ReferenceEntry, String> {
    let mut entry = ReferenceEntry::default();

    for &(idx, column) in columns {
        let raw = record.get(idx).unwrap_or("").trim();
        if raw.is_empty() {
            continue;
        }
        match column {
            Column::Label => entry.label = raw.to_string(),
            Column::Age => entry.age = Some(raw.to_string()),
            Column::Teff => {
                let teff = parse_number(raw, "Teff")?;
                if is_measured(teff) {
                    if teff < 0.0 {
                        return Err(format!("Negative Teff `{raw}`."));
                    }
                    entry.teff = Some(teff.round() as u32);
                }
            }
            Column::Rsun => entry.rsun = parse_optional(raw, "Rsun")?,
            Column::Msun => entry.msun = parse_optional(raw, "Msun")?,
            Column::LogG => entry.log_g = parse_optional(raw, "logG")?,
            Column::Color(key) => {
                if let Some(v) = parse_optional(raw, key.key())? {
                    entry.colors.insert(key, v);
                }
            }
            Column::Magnitude(band) => {
                if let Some(v) = parse_optional(raw, band.key())? {
                    entry.magnitudes.insert(band, v);
                }
            }
            Column::Error(band) => {
                if let Some(v) = parse_optional(raw, band.key())? {
                    entry.errors.insert(band, v);
                }
            }
        }
    }

    if entry.label.is_empty() && entry.teff.is_none() {
        return Err("Row has neither a spectral type nor a Teff.".to_string());
    }
    Ok(entry)
}

fn parse_number(raw: &str, column: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("Invalid number `{raw}` in column `{column}`."))
}

/// Parse a cell, mapping the `0` sentinel and placeholders to `None`.
fn parse_optional(raw: &str, column: &str) -> Result<Option<f64>, String> {
    if matches!(raw, "..." | "-" | "nan" | "NaN") {
        return Ok(None);
    }
    let v = parse_number(raw, column)?;
    Ok(Some(v).filter(|&v| is_measured(v)))
}

/// The lookup assumes monotonic ordering; flag tables that break it.
fn warn_on_unordered_teff(entries: &[ReferenceEntry]) {
    let mut direction = 0i8;
    for pair in entries.windows(2) {
        let (Some(a), Some(b)) = (pair[0].teff, pair[1].teff) else {
            continue;
        };
        if pair[0].log_g != pair[1].log_g {
            direction = 0;
            continue;
        }
        let step = (b as i64 - a as i64).signum() as i8;
        if step == 0 {
            continue;
        }
        if direction != 0 && step != direction {
            warn!(
                from = a,
                to = b,
                label = pair[1].label.as_str(),
                "Teff sequence changes direction; bracket lookups may be unreliable"
            );
        }
        direction = step;
    }
}
