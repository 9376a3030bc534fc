//! SED template matching: median-offset scoring with outlier rejection.

pub mod matcher;

pub use matcher::*;
