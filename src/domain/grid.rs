//! Immutable reference grids.
//!
//! A grid is an ordered sequence of `ReferenceEntry` rows. The lookup engine
//! walks it as a sliding window of adjacent entries, so the row order is a
//! precondition: entries must run monotonically along the sequence the grid
//! represents. The grid does not verify that ordering.

use crate::domain::types::{GridKind, ReferenceEntry};
use crate::error::AppError;

/// Tolerance when grouping white-dwarf rows into cooling tracks by `log_g`.
const LOG_G_EPS: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct ReferenceGrid {
    kind: GridKind,
    entries: Vec<ReferenceEntry>,
}

impl ReferenceGrid {
    /// Build a grid. Fewer than two entries cannot form a bracket and is rejected.
    pub fn new(kind: GridKind, entries: Vec<ReferenceEntry>) -> Result<Self, AppError> {
        if entries.len() < 2 {
            return Err(AppError::precondition(format!(
                "A {} grid needs at least 2 entries, got {}.",
                kind.display_name(),
                entries.len()
            )));
        }
        Ok(Self { kind, entries })
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose label equals `label` exactly.
    pub fn find_by_label(&self, label: &str) -> Option<&ReferenceEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// Split the grid into contiguous runs sharing the same `log_g`.
    ///
    /// Rows without `log_g` only group with other rows without it. A main-sequence
    /// grid therefore comes back as a single track.
    pub fn tracks(&self) -> Vec<&[ReferenceEntry]> {
        let mut out = Vec::new();
        let mut start = 0;
        for i in 1..self.entries.len() {
            if !same_track(&self.entries[i - 1], &self.entries[i]) {
                out.push(&self.entries[start..i]);
                start = i;
            }
        }
        out.push(&self.entries[start..]);
        out
    }
}

fn same_track(a: &ReferenceEntry, b: &ReferenceEntry) -> bool {
    match (a.log_g, b.log_g) {
        (Some(x), Some(y)) => (x - y).abs() < LOG_G_EPS,
        (None, None) => true,
        _ => false,
    }
}

/// Adjacent pairs of `entries`, starting with `(entries[0], entries[0])`.
///
/// The leading self-pair lets an observation that equals the first entry's
/// value exactly produce a result.
pub fn bracket_pairs(
    entries: &[ReferenceEntry],
) -> impl Iterator<Item = (&ReferenceEntry, &ReferenceEntry)> {
    entries
        .first()
        .map(|first| (first, first))
        .into_iter()
        .chain(entries.windows(2).map(|w| (&w[0], &w[1])))
}
