//! Read/write results JSON files.
//!
//! A results file is the portable record of one run:
//! - which grid was used and when the run happened
//! - whichever result lists the command produced (the others stay empty)
//!
//! The schema is defined by `domain::ResultsFile`; `spt show` renders it back.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{DistanceLookupResult, GridKind, LookupResult, ResultsFile, SedBestMatch};
use crate::error::AppError;

pub const TOOL_NAME: &str = "spt";

impl ResultsFile {
    /// An empty record for `grid`, stamped with the current time.
    pub fn new(grid: GridKind) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            generated_at: Utc::now(),
            grid,
            lookup: Vec::new(),
            distances: Vec::new(),
            matches: Vec::new(),
        }
    }

    pub fn with_lookup(mut self, lookup: Vec<LookupResult>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_distances(mut self, distances: Vec<DistanceLookupResult>) -> Self {
        self.distances = distances;
        self
    }

    pub fn with_matches(mut self, matches: Vec<SedBestMatch>) -> Self {
        self.matches = matches;
        self
    }
}

/// Write a results JSON file.
pub fn write_results_json(path: &Path, results: &ResultsFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::input(format!("Failed to create results JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, results)
        .map_err(|e| AppError::input(format!("Failed to write results JSON: {e}")))
}

/// Read a results JSON file.
pub fn read_results_json(path: &Path) -> Result<ResultsFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::input(format!("Failed to open results JSON '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid results JSON: {e}")))
}
