//! Shared numeric building blocks for the integration time calculator.
//!
//! This crate holds the leaf data structures every calculator depends on:
//! one-dimensional tabulated curves, two-dimensional lookup grids and the
//! loader that turns named text resources into either of them.

pub mod algo;
pub mod resource;

pub use algo::grid2d::{Grid2D, GridError};
pub use algo::tabulated::{CurveError, TabulatedCurve};
pub use resource::{ResourceError, ResourceLibrary};
