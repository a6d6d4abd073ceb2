//! Interpolation primitives for tabulated reference data.

pub mod grid2d;
pub mod tabulated;

pub use grid2d::{Grid2D, GridError};
pub use tabulated::{CurveError, TabulatedCurve};
