//! Two-dimensional lookup grids.
//!
//! A [`Grid2D`] stores a dense `value[y][x]` table over two strictly
//! increasing axes. It is the in-memory form of the slit-throughput table
//! and any other 2D calibration resource.
//!
//! Two access styles are offered. [`Grid2D::interpolate`] is a strict
//! bilinear lookup that rejects coordinates outside the grid. Callers that
//! need their own edge policy use [`Grid2D::bracket`] to locate the cell and
//! [`Grid2D::interpolate_cell`] to blend its four corners.

use ndarray::Array2;
use thiserror::Error;

/// Error types for grid construction and lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// Coordinate is outside the grid
    #[error("{axis} coordinate {value} is outside grid range [{min}, {max}]")]
    OutOfBounds {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Axis is not strictly increasing
    #[error("{axis} axis is not strictly increasing at index {index}")]
    NotIncreasing { axis: &'static str, index: usize },
    /// Table shape disagrees with the axes
    #[error("Grid shape ({data_shape:?}) doesn't match axis lengths (x: {x_len}, y: {y_len})")]
    DimensionMismatch {
        x_len: usize,
        y_len: usize,
        data_shape: (usize, usize),
    },
    /// An axis has no entries
    #[error("{0} axis is empty")]
    EmptyAxis(&'static str),
    /// An axis value is NaN or infinite
    #[error("{axis} axis value at index {index} is not finite")]
    NonFinite { axis: &'static str, index: usize },
}

/// Dense 2D table indexed as `[y_index, x_index]`.
#[derive(Debug, Clone)]
pub struct Grid2D {
    x_axis: Vec<f64>,
    y_axis: Vec<f64>,
    data: Array2<f64>,
}

fn check_axis(axis: &[f64], name: &'static str) -> Result<(), GridError> {
    if axis.is_empty() {
        return Err(GridError::EmptyAxis(name));
    }
    if let Some(index) = axis.iter().position(|v| !v.is_finite()) {
        return Err(GridError::NonFinite { axis: name, index });
    }
    for i in 1..axis.len() {
        if !(axis[i] > axis[i - 1]) {
            return Err(GridError::NotIncreasing { axis: name, index: i });
        }
    }
    Ok(())
}

impl Grid2D {
    /// Create a grid from its axes and a `(y_axis.len(), x_axis.len())` table.
    pub fn new(x_axis: Vec<f64>, y_axis: Vec<f64>, data: Array2<f64>) -> Result<Self, GridError> {
        let (ny, nx) = data.dim();
        if nx != x_axis.len() || ny != y_axis.len() {
            return Err(GridError::DimensionMismatch {
                x_len: x_axis.len(),
                y_len: y_axis.len(),
                data_shape: (ny, nx),
            });
        }
        check_axis(&x_axis, "X")?;
        check_axis(&y_axis, "Y")?;

        Ok(Self {
            x_axis,
            y_axis,
            data,
        })
    }

    /// Create a grid from a flat row-major table (`rows` are y, columns are x).
    pub fn from_row_major(
        x_axis: Vec<f64>,
        y_axis: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, GridError> {
        let shape = (y_axis.len(), x_axis.len());
        let found = values.len();
        let data = Array2::from_shape_vec(shape, values).map_err(|_| GridError::DimensionMismatch {
            x_len: shape.1,
            y_len: shape.0,
            data_shape: (found, 1),
        })?;
        Self::new(x_axis, y_axis, data)
    }

    pub fn x_axis(&self) -> &[f64] {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &[f64] {
        &self.y_axis
    }

    pub fn x_max(&self) -> f64 {
        self.x_axis[self.x_axis.len() - 1]
    }

    pub fn y_max(&self) -> f64 {
        self.y_axis[self.y_axis.len() - 1]
    }

    /// Value stored at column `ix`, row `iy`.
    pub fn value(&self, ix: usize, iy: usize) -> f64 {
        self.data[[iy, ix]]
    }

    /// Last index whose axis value is `<= v`, by linear scan.
    ///
    /// Calibration grids have a few dozen entries at most, so a scan is as
    /// fast as a binary search here. Returns `None` below the first entry.
    pub fn bracket(axis: &[f64], v: f64) -> Option<usize> {
        if axis.is_empty() || !(v >= axis[0]) {
            return None;
        }
        let mut low = 0;
        for (i, &a) in axis.iter().enumerate() {
            if a <= v {
                low = i;
            } else {
                break;
            }
        }
        Some(low)
    }

    /// Bilinear blend of the cell whose lower corner is `(lx, ly)`.
    ///
    /// `lx` and `ly` must not be the last index of their axis.
    pub fn interpolate_cell(&self, lx: usize, ly: usize, x: f64, y: f64) -> f64 {
        let t = (x - self.x_axis[lx]) / (self.x_axis[lx + 1] - self.x_axis[lx]);
        let u = (y - self.y_axis[ly]) / (self.y_axis[ly + 1] - self.y_axis[ly]);

        let q11 = self.value(lx, ly);
        let q21 = self.value(lx + 1, ly);
        let q12 = self.value(lx, ly + 1);
        let q22 = self.value(lx + 1, ly + 1);

        (1.0 - t) * (1.0 - u) * q11 + t * (1.0 - u) * q21 + t * u * q22 + (1.0 - t) * u * q12
    }

    /// Strict bilinear interpolation; coordinates must lie inside the grid.
    pub fn interpolate(&self, x: f64, y: f64) -> Result<f64, GridError> {
        let lx = Self::bracket(&self.x_axis, x)
            .filter(|_| x <= self.x_max())
            .ok_or(GridError::OutOfBounds {
                axis: "X",
                value: x,
                min: self.x_axis[0],
                max: self.x_max(),
            })?;
        let ly = Self::bracket(&self.y_axis, y)
            .filter(|_| y <= self.y_max())
            .ok_or(GridError::OutOfBounds {
                axis: "Y",
                value: y,
                min: self.y_axis[0],
                max: self.y_max(),
            })?;

        // Clamp onto the last full cell so the upper edge is reachable
        let lx = lx.min(self.x_axis.len().saturating_sub(2));
        let ly = ly.min(self.y_axis.len().saturating_sub(2));
        if self.x_axis.len() == 1 || self.y_axis.len() == 1 {
            return Ok(self.value(lx, ly));
        }

        Ok(self.interpolate_cell(lx, ly, x, y))
    }
}
