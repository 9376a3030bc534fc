//! Domain types used throughout the lookup engine.
//!
//! This module defines:
//!
//! - photometric keys (`ColorIndex`, `Band`) and grid kinds (`GridKind`)
//! - reference rows and the immutable grid that owns them
//! - result value objects (`LookupResult`, `DistanceLookupResult`, `SedBestMatch`)

pub mod grid;
pub mod spt;
pub mod types;

pub use grid::*;
pub use spt::*;
pub use types::*;
