//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds a `LookupConfig` from flags, `.env` and defaults
//! - loads the selected grid and hands it to the lookup pipeline
//! - prints tables and writes optional exports

use std::collections::BTreeMap;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Cli, Command, CommonArgs, DEFAULT_TOLERANCE, DistanceArgs, LookupArgs, SedArgs, ShowArgs,
    TeffArgs, to_map,
};
use crate::domain::{GridKind, LookupConfig, ResultsFile};
use crate::error::AppError;
use crate::io::{
    read_results_json, resolve_grid_dir, write_distance_csv, write_lookup_csv, write_results_json,
    write_sed_csv,
};
use crate::report;
use crate::sed::MatchOptions;

pub mod pipeline;

/// Entry point for the `spt` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Lookup(args) => handle_lookup(args),
        Command::Teff(args) => handle_teff(args),
        Command::Distance(args) => handle_distance(args),
        Command::Sed(args) => handle_sed(args),
        Command::Show(args) => handle_show(args),
    }
}

/// Logs go to stderr so stdout carries only tables. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_lookup(args: LookupArgs) -> Result<(), AppError> {
    let config = config_from_common(&args.common, args.grid);
    let grid = pipeline::load_configured_grid(&config)?;
    let results = pipeline::run_lookup(&grid, &to_map(&args.colors));

    print!("{}", report::format_banner(config.grid));
    print!("{}", report::format_lookup(&results));

    if let Some(path) = &config.export_results {
        write_lookup_csv(path, &results)?;
    }
    if let Some(path) = &config.export_json {
        write_results_json(path, &ResultsFile::new(config.grid).with_lookup(results))?;
    }
    Ok(())
}

fn handle_teff(args: TeffArgs) -> Result<(), AppError> {
    let mut config = config_from_common(&args.common, GridKind::WhiteDwarf);
    config.log_g = args.log_g;
    let grid = pipeline::load_configured_grid(&config)?;
    let results = pipeline::run_teff(&grid, &to_map(&args.colors), config.log_g);

    print!("{}", report::format_banner(config.grid));
    print!("{}", report::format_lookup(&results));

    if let Some(path) = &config.export_results {
        write_lookup_csv(path, &results)?;
    }
    if let Some(path) = &config.export_json {
        write_results_json(path, &ResultsFile::new(config.grid).with_lookup(results))?;
    }
    Ok(())
}

fn handle_distance(args: DistanceArgs) -> Result<(), AppError> {
    let config = config_from_common(&args.common, args.grid);
    let grid = pipeline::load_configured_grid(&config)?;
    let results = pipeline::run_distance(
        &grid,
        &args.spt,
        &to_map(&args.mags),
        &to_map(&args.errors),
    );

    print!("{}", report::format_banner(config.grid));
    print!("{}", report::format_distances(&args.spt, &results));

    if let Some(path) = &config.export_results {
        write_distance_csv(path, &results)?;
    }
    if let Some(path) = &config.export_json {
        write_results_json(path, &ResultsFile::new(config.grid).with_distances(results))?;
    }
    Ok(())
}

fn handle_sed(args: SedArgs) -> Result<(), AppError> {
    let mut config = config_from_common(&args.common, args.grid);
    config.tolerance = args.tolerance;
    config.best_only = args.best_only;
    config.overplot = args.overplot;

    let observed: BTreeMap<_, _> = to_map(&args.mags);
    let grid = pipeline::load_configured_grid(&config)?;
    let opts = MatchOptions {
        tolerance: config.tolerance,
        best_only: config.best_only,
    };
    let run = pipeline::run_sed(&grid, &observed, &opts, config.overplot)?;

    print!("{}", report::format_banner(config.grid));
    print!(
        "{}",
        report::format_matches(&run.matches, &observed, run.aligned_best.as_ref())
    );

    if let Some(path) = &config.export_results {
        write_sed_csv(path, &run.matches)?;
    }
    if let Some(path) = &config.export_json {
        write_results_json(path, &ResultsFile::new(config.grid).with_matches(run.matches))?;
    }
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let file = read_results_json(&args.results)?;
    print!("{}", report::format_results_file(&file));
    Ok(())
}

/// Build the run configuration shared by all lookup commands.
pub fn config_from_common(common: &CommonArgs, grid: GridKind) -> LookupConfig {
    LookupConfig {
        grid_dir: resolve_grid_dir(common.grid_dir.as_deref()),
        grid,
        log_g: None,
        tolerance: DEFAULT_TOLERANCE,
        best_only: false,
        overplot: false,
        export_results: common.export.clone(),
        export_json: common.export_json.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn config_uses_explicit_grid_dir_and_defaults() {
        let common = CommonArgs {
            grid_dir: Some(PathBuf::from("/srv/grids")),
            export: Some(PathBuf::from("out.csv")),
            export_json: None,
        };
        let config = config_from_common(&common, GridKind::BrownDwarf);
        assert_eq!(config.grid_dir, Path::new("/srv/grids"));
        assert_eq!(config.grid, GridKind::BrownDwarf);
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.export_results.as_deref(), Some(Path::new("out.csv")));
        assert!(config.export_json.is_none());
    }
}
