//! Reporting utilities: result summaries and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{DistanceLookupResult, LookupResult, num_to_spt};
use crate::math::{mean, median, standard_deviation, standard_error};

/// Mean with population standard deviation and standard error.
#[derive(Debug, Clone, PartialEq)]
pub struct Spread {
    pub mean: f64,
    pub std_dev: f64,
    pub std_err: f64,
}

/// Aggregate view of a bracket lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupSummary {
    pub count: usize,
    /// Median numeric spectral type rendered back to a label.
    pub median_spt: Option<String>,
    pub teff: Option<Spread>,
    pub mean_gap: f64,
}

/// Aggregate view of per-band distances (pc).
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceSummary {
    pub count: usize,
    pub median: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub std_err: f64,
}

/// Summarize lookup results. `None` for an empty list.
pub fn summarize_lookup(results: &[LookupResult]) -> Option<LookupSummary> {
    if results.is_empty() {
        return None;
    }

    let spt_nums: Vec<f64> = results.iter().filter_map(|r| r.spt_num).collect();
    let median_spt = median(&spt_nums).ok().and_then(num_to_spt);

    let teffs: Vec<f64> = results.iter().filter_map(|r| r.teff).map(f64::from).collect();
    let teff = spread(&teffs);

    let gaps: Vec<f64> = results.iter().map(|r| r.gap).collect();

    Some(LookupSummary {
        count: results.len(),
        median_spt,
        teff,
        mean_gap: mean(&gaps).ok()?,
    })
}

/// Summarize per-band distances. `None` for an empty list.
pub fn summarize_distances(results: &[DistanceLookupResult]) -> Option<DistanceSummary> {
    let distances: Vec<f64> = results.iter().map(|r| r.distance).collect();
    let Spread {
        mean,
        std_dev,
        std_err,
    } = spread(&distances)?;

    Some(DistanceSummary {
        count: distances.len(),
        median: median(&distances).ok()?,
        mean,
        std_dev,
        std_err,
    })
}

fn spread(values: &[f64]) -> Option<Spread> {
    Some(Spread {
        mean: mean(values).ok()?,
        std_dev: standard_deviation(values).ok()?,
        std_err: standard_error(values).ok()?,
    })
}
