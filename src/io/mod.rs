//! Input/output helpers.
//!
//! - reference grid CSV loading (`grid`)
//! - result exports to CSV (`export`)
//! - results JSON read/write (`results`)

pub mod export;
pub mod grid;
pub mod results;

pub use export::*;
pub use grid::*;
pub use results::*;
