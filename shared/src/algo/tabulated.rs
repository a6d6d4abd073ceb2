//! One-dimensional tabulated curves with linear interpolation.
//!
//! A [`TabulatedCurve`] holds an immutable table of `(x, y)` rows with `x`
//! strictly increasing. It backs every transmission curve, sky background,
//! SED template and the peak-pixel fraction curve used by the calculators.
//!
//! Lookups outside `[x_min, x_max]` return `0.0` instead of an error. Many
//! callers multiply a spectrum by a curve that only covers part of the
//! wavelength range, and a zero outside the table is the intended result.

use thiserror::Error;

/// Errors raised while building a tabulated curve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("Curve needs at least 2 rows, got {0}")]
    InsufficientData(usize),
    #[error("Column lengths differ: {x_len} x values, {y_len} y values")]
    MismatchedLengths { x_len: usize, y_len: usize },
    #[error("X values must be strictly increasing: row {index} has {value} after {previous}")]
    NotIncreasing {
        index: usize,
        previous: f64,
        value: f64,
    },
    #[error("Non-finite value at row {0}")]
    NonFinite(usize),
}

/// Immutable sorted `(x, y)` table.
///
/// # Examples
///
/// ```rust
/// use shared::algo::tabulated::TabulatedCurve;
///
/// let curve = TabulatedCurve::new(vec![400.0, 500.0, 600.0], vec![0.2, 0.4, 0.8]).unwrap();
/// assert!((curve.value_at(450.0) - 0.3).abs() < 1e-12);
/// assert_eq!(curve.value_at(399.0), 0.0);
/// assert_eq!(curve.value_at(600.0), 0.8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedCurve {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl TabulatedCurve {
    /// Build a curve from separate x and y columns.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, CurveError> {
        if xs.len() != ys.len() {
            return Err(CurveError::MismatchedLengths {
                x_len: xs.len(),
                y_len: ys.len(),
            });
        }
        if xs.len() < 2 {
            return Err(CurveError::InsufficientData(xs.len()));
        }
        for (i, (x, y)) in xs.iter().zip(ys.iter()).enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(CurveError::NonFinite(i));
            }
        }
        for i in 1..xs.len() {
            if xs[i] <= xs[i - 1] {
                return Err(CurveError::NotIncreasing {
                    index: i,
                    previous: xs[i - 1],
                    value: xs[i],
                });
            }
        }

        Ok(Self { xs, ys })
    }

    /// Build a curve from `(x, y)` rows.
    pub fn from_rows(rows: &[(f64, f64)]) -> Result<Self, CurveError> {
        let (xs, ys) = rows.iter().copied().unzip();
        Self::new(xs, ys)
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false; construction rejects tables with fewer than 2 rows.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn x_min(&self) -> f64 {
        self.xs[0]
    }

    pub fn x_max(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }

    /// Index of the row at or below `x`, found by binary search.
    ///
    /// Returns `None` when `x` lies outside the table (or is NaN). At
    /// `x == x_max` the last row index is returned.
    pub fn lower_index(&self, x: f64) -> Option<usize> {
        if !(x >= self.x_min() && x <= self.x_max()) {
            return None;
        }
        // partition_point yields the first row strictly above x
        let idx = self.xs.partition_point(|&v| v <= x);
        Some(idx - 1)
    }

    /// Linearly interpolated value at `x`, or `0.0` outside the table.
    pub fn value_at(&self, x: f64) -> f64 {
        let Some(low) = self.lower_index(x) else {
            return 0.0;
        };
        if low == self.xs.len() - 1 {
            return self.ys[low];
        }

        let (x1, x2) = (self.xs[low], self.xs[low + 1]);
        let (y1, y2) = (self.ys[low], self.ys[low + 1]);
        let t = (x - x1) / (x2 - x1);
        y1 + t * (y2 - y1)
    }

    /// Trapezoidal integral over the whole table.
    pub fn integral(&self) -> f64 {
        self.xs
            .windows(2)
            .zip(self.ys.windows(2))
            .map(|(x, y)| 0.5 * (x[1] - x[0]) * (y[0] + y[1]))
            .sum()
    }

    /// Returns a copy with every y value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            xs: self.xs.clone(),
            ys: self.ys.iter().map(|y| y * factor).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> TabulatedCurve {
        TabulatedCurve::new(vec![1.0, 2.0, 4.0, 8.0], vec![10.0, 20.0, 40.0, 0.0]).unwrap()
    }

    #[test]
    fn test_exact_rows() {
        let curve = ramp();
        for (x, y) in curve.xs().iter().zip(curve.ys().iter()) {
            assert_eq!(curve.value_at(*x), *y);
        }
    }

    #[test]
    fn test_linear_between_rows() {
        let curve = ramp();
        assert_relative_eq!(curve.value_at(1.5), 15.0, epsilon = 1e-12);
        assert_relative_eq!(curve.value_at(3.0), 30.0, epsilon = 1e-12);
        assert_relative_eq!(curve.value_at(6.0), 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_outside_domain_is_zero() {
        let curve = ramp();
        assert_eq!(curve.value_at(0.999), 0.0);
        assert_eq!(curve.value_at(-100.0), 0.0);
        assert_eq!(curve.value_at(8.0001), 0.0);
        assert_eq!(curve.value_at(f64::NAN), 0.0);
    }

    #[test]
    fn test_lower_index() {
        let curve = ramp();
        assert_eq!(curve.lower_index(1.0), Some(0));
        assert_eq!(curve.lower_index(3.9), Some(1));
        assert_eq!(curve.lower_index(4.0), Some(2));
        assert_eq!(curve.lower_index(8.0), Some(3));
        assert_eq!(curve.lower_index(0.5), None);
    }

    #[test]
    fn test_integral() {
        let curve = TabulatedCurve::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 3.0]).unwrap();
        assert_relative_eq!(curve.integral(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(
            TabulatedCurve::new(vec![1.0], vec![1.0]),
            Err(CurveError::InsufficientData(1))
        );
        assert!(matches!(
            TabulatedCurve::new(vec![1.0, 2.0], vec![1.0]),
            Err(CurveError::MismatchedLengths { x_len: 2, y_len: 1 })
        ));
        assert!(matches!(
            TabulatedCurve::new(vec![1.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]),
            Err(CurveError::NotIncreasing { index: 1, .. })
        ));
        assert_eq!(
            TabulatedCurve::new(vec![1.0, 2.0], vec![f64::NAN, 1.0]),
            Err(CurveError::NonFinite(0))
        );
    }

    #[test]
    fn test_from_rows_and_scaled() {
        let curve = TabulatedCurve::from_rows(&[(1.0, 2.0), (2.0, 4.0)]).unwrap();
        let doubled = curve.scaled(2.0);
        assert_eq!(doubled.ys(), &[4.0, 8.0]);
        assert_eq!(doubled.xs(), curve.xs());
    }
}
