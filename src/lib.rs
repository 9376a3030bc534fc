//! `stellar-lookup` library crate.
//!
//! The binary (`spt`) is a thin wrapper around this library so that:
//!
//! - lookup logic is testable without spawning processes
//! - grids and lookups are reusable from other tools and notebooks
//!
//! Layout: `domain` holds the typed data model, `io` loads grids and writes
//! results, `lookup` and `sed` are the engines, `report` formats output.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod lookup;
pub mod math;
pub mod report;
pub mod sed;
