//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built once from reference tables and shared read-only
//! - exported to JSON/CSV
//! - reloaded later for display

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::spt::spt_to_num;

/// A color index (difference of two band magnitudes).
///
/// Variants are declared blue-to-red so ordered maps iterate in a stable,
/// physically meaningful order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColorIndex {
    #[serde(rename = "U_B")]
    UB,
    #[serde(rename = "B_V")]
    BV,
    #[serde(rename = "V_R")]
    VR,
    #[serde(rename = "V_I")]
    VI,
    #[serde(rename = "V_K")]
    VK,
    #[serde(rename = "G_V")]
    GV,
    #[serde(rename = "BP_RP")]
    BpRp,
    #[serde(rename = "G_RP")]
    GRp,
    #[serde(rename = "J_H")]
    JH,
    #[serde(rename = "H_K")]
    HK,
    #[serde(rename = "K_W1")]
    KW1,
    #[serde(rename = "W1_W2")]
    W1W2,
    #[serde(rename = "W1_W3")]
    W1W3,
    #[serde(rename = "W1_W4")]
    W1W4,
    #[serde(rename = "g_r")]
    Ps1GR,
    #[serde(rename = "r_i")]
    Ps1RI,
    #[serde(rename = "i_z")]
    Ps1IZ,
    #[serde(rename = "z_y")]
    Ps1ZY,
}

impl ColorIndex {
    pub const ALL: [ColorIndex; 18] = [
        ColorIndex::UB,
        ColorIndex::BV,
        ColorIndex::VR,
        ColorIndex::VI,
        ColorIndex::VK,
        ColorIndex::GV,
        ColorIndex::BpRp,
        ColorIndex::GRp,
        ColorIndex::JH,
        ColorIndex::HK,
        ColorIndex::KW1,
        ColorIndex::W1W2,
        ColorIndex::W1W3,
        ColorIndex::W1W4,
        ColorIndex::Ps1GR,
        ColorIndex::Ps1RI,
        ColorIndex::Ps1IZ,
        ColorIndex::Ps1ZY,
    ];

    /// Canonical key, as used in CLI input, CSV headers and exports.
    pub fn key(self) -> &'static str {
        match self {
            ColorIndex::UB => "U_B",
            ColorIndex::BV => "B_V",
            ColorIndex::VR => "V_R",
            ColorIndex::VI => "V_I",
            ColorIndex::VK => "V_K",
            ColorIndex::GV => "G_V",
            ColorIndex::BpRp => "BP_RP",
            ColorIndex::GRp => "G_RP",
            ColorIndex::JH => "J_H",
            ColorIndex::HK => "H_K",
            ColorIndex::KW1 => "K_W1",
            ColorIndex::W1W2 => "W1_W2",
            ColorIndex::W1W3 => "W1_W3",
            ColorIndex::W1W4 => "W1_W4",
            ColorIndex::Ps1GR => "g_r",
            ColorIndex::Ps1RI => "r_i",
            ColorIndex::Ps1IZ => "i_z",
            ColorIndex::Ps1ZY => "z_y",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            ColorIndex::VR => &["V_Rc"],
            ColorIndex::VI => &["V_Ic"],
            ColorIndex::VK => &["V_Ks"],
            ColorIndex::BpRp => &["Bp_Rp"],
            ColorIndex::GRp => &["G_Rp"],
            ColorIndex::HK => &["H_Ks"],
            ColorIndex::KW1 => &["Ks_W1"],
            _ => &[],
        }
    }

    /// Parse a key such as `B_V`, `B-V` or `H-Ks`. Case is significant.
    pub fn from_key(s: &str) -> Option<Self> {
        let norm = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.key() == norm || c.aliases().contains(&norm.as_str()))
    }
}

impl fmt::Display for ColorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ColorIndex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("Unknown color index `{s}`."))
    }
}

/// A photometric band.
///
/// Lower-case keys are the Pan-STARRS1 bands; upper-case are Johnson/Cousins,
/// Gaia, 2MASS and WISE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    U,
    B,
    V,
    R,
    I,
    G,
    #[serde(rename = "BP")]
    Bp,
    #[serde(rename = "RP")]
    Rp,
    #[serde(rename = "g")]
    Ps1G,
    #[serde(rename = "r")]
    Ps1R,
    #[serde(rename = "i")]
    Ps1I,
    #[serde(rename = "z")]
    Ps1Z,
    #[serde(rename = "y")]
    Ps1Y,
    J,
    H,
    K,
    W1,
    W2,
    W3,
    W4,
}

impl Band {
    pub const ALL: [Band; 20] = [
        Band::U,
        Band::B,
        Band::V,
        Band::R,
        Band::I,
        Band::G,
        Band::Bp,
        Band::Rp,
        Band::Ps1G,
        Band::Ps1R,
        Band::Ps1I,
        Band::Ps1Z,
        Band::Ps1Y,
        Band::J,
        Band::H,
        Band::K,
        Band::W1,
        Band::W2,
        Band::W3,
        Band::W4,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Band::U => "U",
            Band::B => "B",
            Band::V => "V",
            Band::R => "R",
            Band::I => "I",
            Band::G => "G",
            Band::Bp => "BP",
            Band::Rp => "RP",
            Band::Ps1G => "g",
            Band::Ps1R => "r",
            Band::Ps1I => "i",
            Band::Ps1Z => "z",
            Band::Ps1Y => "y",
            Band::J => "J",
            Band::H => "H",
            Band::K => "K",
            Band::W1 => "W1",
            Band::W2 => "W2",
            Band::W3 => "W3",
            Band::W4 => "W4",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Band::R => &["Rc"],
            Band::I => &["Ic"],
            Band::Bp => &["Bp"],
            Band::Rp => &["Rp"],
            Band::K => &["Ks"],
            _ => &[],
        }
    }

    /// Parse a band key such as `G`, `BP` or `Ks`. Case is significant.
    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|b| b.key() == s || b.aliases().contains(&s))
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("Unknown band `{s}`."))
    }
}

/// Which reference grid a table represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GridKind {
    MainSequence,
    BrownDwarf,
    WhiteDwarf,
}

impl GridKind {
    pub fn display_name(self) -> &'static str {
        match self {
            GridKind::MainSequence => "main sequence",
            GridKind::BrownDwarf => "brown dwarf",
            GridKind::WhiteDwarf => "white dwarf",
        }
    }

    /// File name of the bundled table inside a grid directory.
    pub fn file_name(self) -> &'static str {
        match self {
            GridKind::MainSequence => "main_sequence.csv",
            GridKind::BrownDwarf => "brown_dwarfs.csv",
            GridKind::WhiteDwarf => "white_dwarfs.csv",
        }
    }
}

/// One row of a reference grid.
///
/// Absent values are `None` / missing map keys. A stored `0.0` is still
/// treated as absent by the accessors, so callers see the same behavior
/// whether the loader dropped the zero or not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub label: String,
    pub teff: Option<u32>,
    pub rsun: Option<f64>,
    pub msun: Option<f64>,
    pub log_g: Option<f64>,
    pub age: Option<String>,
    pub colors: BTreeMap<ColorIndex, f64>,
    /// Absolute magnitudes per band.
    pub magnitudes: BTreeMap<Band, f64>,
    /// Magnitude uncertainties per band.
    pub errors: BTreeMap<Band, f64>,
}

impl ReferenceEntry {
    pub fn color(&self, key: ColorIndex) -> Option<f64> {
        self.colors.get(&key).copied().filter(|&v| is_measured(v))
    }

    pub fn magnitude(&self, band: Band) -> Option<f64> {
        self.magnitudes.get(&band).copied().filter(|&v| is_measured(v))
    }

    pub fn error(&self, band: Band) -> Option<f64> {
        self.errors.get(&band).copied().filter(|&v| is_measured(v))
    }
}

/// `0.0` is the "not measured" sentinel throughout the lookup core.
pub fn is_measured(value: f64) -> bool {
    value != 0.0 && value.is_finite()
}

/// Output of bracket interpolation for a single color index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub color_key: ColorIndex,
    /// Observed color value.
    pub color_value: f64,
    pub spt: String,
    pub teff: Option<u32>,
    pub rsun: Option<f64>,
    pub msun: Option<f64>,
    pub log_g: Option<f64>,
    pub age: Option<String>,
    /// Reference color value the observation snapped to.
    pub nearest: f64,
    /// `|color_value - nearest|`.
    pub gap: f64,
    pub spt_num: Option<f64>,
}

impl LookupResult {
    pub fn from_entry(
        color_key: ColorIndex,
        color_value: f64,
        entry: &ReferenceEntry,
        nearest: f64,
    ) -> Self {
        Self {
            color_key,
            color_value,
            spt: entry.label.clone(),
            teff: entry.teff,
            rsun: entry.rsun,
            msun: entry.msun,
            log_g: entry.log_g,
            age: entry.age.clone(),
            nearest,
            gap: (color_value - nearest).abs(),
            spt_num: spt_to_num(&entry.label),
        }
    }
}

/// Photometric distance derived from a single band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceLookupResult {
    pub band: Band,
    /// Observed apparent magnitude.
    pub band_value: f64,
    pub spt: String,
    /// Distance in parsecs.
    pub distance: f64,
    pub distance_error: Option<f64>,
}

/// A reference SED template accepted by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SedBestMatch {
    pub spt: String,
    /// Offset to add to template magnitudes to align them with the observation.
    pub median_diff_mag: f64,
    /// Mean residual after removing the median offset (lower is better).
    pub mean_diff_mag: f64,
    /// Number of bands shared by the observation and the template.
    pub bands: usize,
    /// Bands whose residual reached the tolerance.
    pub outliers: usize,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub grid_dir: PathBuf,
    pub grid: GridKind,
    /// Cooling track selector for white-dwarf Teff lookups.
    pub log_g: Option<f64>,
    /// Residual tolerance (mag) for SED matching.
    pub tolerance: f64,
    pub best_only: bool,
    /// Show templates at native brightness (offset forced to zero).
    pub overplot: bool,
    pub export_results: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// A saved results file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub grid: GridKind,
    #[serde(default)]
    pub lookup: Vec<LookupResult>,
    #[serde(default)]
    pub distances: Vec<DistanceLookupResult>,
    #[serde(default)]
    pub matches: Vec<SedBestMatch>,
}
