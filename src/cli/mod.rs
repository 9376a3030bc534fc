//! Command-line parsing for the spectral type lookup tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! lookup code. Observations are passed as repeated `KEY=VALUE` pairs, e.g.
//! `-c B-V=1.95 -c W1-W2=0.205` or `-m G=12.3 -m J=9.8`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{Band, ColorIndex, GridKind};

/// Default residual tolerance (mag) for SED matching.
pub const DEFAULT_TOLERANCE: f64 = 0.25;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "spt",
    version,
    about = "Spectral type, Teff and distance lookup against stellar reference grids"
)]
pub struct Cli {
    /// Increase log verbosity (`-v` info, `-vv` debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Infer spectral type and physical parameters from observed colors.
    Lookup(LookupArgs),
    /// Infer white-dwarf Teff, mass and age from colors along cooling tracks.
    Teff(TeffArgs),
    /// Photometric distance per band for a known spectral type.
    Distance(DistanceArgs),
    /// Match an observed SED against the grid's absolute-magnitude templates.
    Sed(SedArgs),
    /// Print a results JSON file written with `--export-json`.
    Show(ShowArgs),
}

/// Options shared by every lookup command.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Directory holding the grid CSVs (falls back to `STELLAR_GRID_DIR`, then `data`).
    #[arg(long, value_name = "DIR")]
    pub grid_dir: Option<PathBuf>,

    /// Export results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export results to JSON (readable by `spt show`).
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct LookupArgs {
    /// Observed color, e.g. `B-V=1.95`. Repeatable.
    #[arg(short = 'c', long = "color", value_name = "KEY=VALUE", required = true, value_parser = parse_color)]
    pub colors: Vec<(ColorIndex, f64)>,

    /// Reference grid to search.
    #[arg(long, value_enum, default_value_t = GridKind::MainSequence)]
    pub grid: GridKind,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct TeffArgs {
    /// Observed color, e.g. `BP-RP=0.45`. Repeatable.
    #[arg(short = 'c', long = "color", value_name = "KEY=VALUE", required = true, value_parser = parse_color)]
    pub colors: Vec<(ColorIndex, f64)>,

    /// Restrict the search to the cooling track nearest this log g.
    #[arg(long = "log-g", value_name = "LOGG")]
    pub log_g: Option<f64>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DistanceArgs {
    /// Spectral type label exactly as in the grid, e.g. `M5V`.
    #[arg(long, value_name = "LABEL")]
    pub spt: String,

    /// Apparent magnitude, e.g. `J=9.8`. Repeatable.
    #[arg(short = 'm', long = "mag", value_name = "BAND=MAG", required = true, value_parser = parse_band)]
    pub mags: Vec<(Band, f64)>,

    /// Apparent magnitude error, e.g. `J=0.02`. Repeatable.
    #[arg(short = 'e', long = "err", value_name = "BAND=ERR", value_parser = parse_band)]
    pub errors: Vec<(Band, f64)>,

    #[arg(long, value_enum, default_value_t = GridKind::MainSequence)]
    pub grid: GridKind,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SedArgs {
    /// Apparent magnitude, e.g. `W1=11.2`. Repeatable; at least four bands are needed.
    #[arg(short = 'm', long = "mag", value_name = "BAND=MAG", required = true, value_parser = parse_band)]
    pub mags: Vec<(Band, f64)>,

    #[arg(long, value_enum, default_value_t = GridKind::MainSequence)]
    pub grid: GridKind,

    /// Residual (mag) under which a band is considered consistent.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,

    /// Report only the single best template.
    #[arg(long)]
    pub best_only: bool,

    /// Compare against the best template at its native brightness (no offset).
    #[arg(long)]
    pub overplot: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Results JSON file produced by `--export-json`.
    #[arg(long, value_name = "JSON")]
    pub results: PathBuf,
}

/// Parse `KEY=VALUE` into a typed key and a finite number.
fn parse_pair<K>(s: &str) -> Result<(K, f64), String>
where
    K: FromStr<Err = String>,
{
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got `{s}`."))?;
    let key = key.trim().parse::<K>()?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid number `{}` in `{s}`.", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("Value in `{s}` must be finite."));
    }
    Ok((key, value))
}

pub fn parse_color(s: &str) -> Result<(ColorIndex, f64), String> {
    parse_pair(s)
}

pub fn parse_band(s: &str) -> Result<(Band, f64), String> {
    parse_pair(s)
}

/// Collect repeated pairs into a map; later values override earlier ones.
pub fn to_map<K: Ord + Copy>(pairs: &[(K, f64)]) -> BTreeMap<K, f64> {
    pairs.iter().copied().collect()
}
