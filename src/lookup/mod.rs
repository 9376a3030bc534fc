//! Grid lookups.
//!
//! Responsibilities:
//!
//! - bracket interpolation of observed colors (`bracket`)
//! - photometric distances for a known spectral type (`distance`)

pub mod bracket;
pub mod distance;

pub use bracket::{lookup, lookup_teff};
pub use distance::{distance_from_modulus, lookup_with_errors};
