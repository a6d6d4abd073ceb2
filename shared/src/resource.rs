//! Loading of tabulated reference data.
//!
//! Resources are whitespace (or comma) delimited text files addressed by a
//! name relative to a data root, e.g. `atmosphere/skytrans_15.dat`. Lines
//! starting with `#` and blank lines are ignored.
//!
//! Two layouts are understood:
//!
//! - **1D curve**: two numeric columns `x y`, sorted by `x` ascending.
//! - **2D grid**: two integer axis lengths `nx ny`, followed by `nx` x-axis
//!   values, `ny` y-axis values and `nx * ny` table values in row-major
//!   order (one row per y value).
//!
//! [`ResourceLibrary`] parses each named resource once and hands out shared
//! [`Arc`] handles afterwards. Loaded tables are never mutated, so the cache
//! can be read from any thread.

use crate::algo::grid2d::{Grid2D, GridError};
use crate::algo::tabulated::{CurveError, TabulatedCurve};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Errors raised while reading or parsing a resource.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to read resource {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Resource {name}, line {line}: cannot parse {token:?} as a number")]
    Parse {
        name: String,
        line: usize,
        token: String,
    },
    #[error("Resource {name}, line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        name: String,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Resource {name} is empty")]
    Empty { name: String },
    #[error("Resource {name}: expected {expected} values, found {found}")]
    ValueCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Resource {name}: invalid axis length {value}")]
    AxisLength { name: String, value: f64 },
    #[error("Resource {name}: {source}")]
    Curve {
        name: String,
        #[source]
        source: CurveError,
    },
    #[error("Resource {name}: {source}")]
    Grid {
        name: String,
        #[source]
        source: GridError,
    },
}

/// Numeric tokens of a resource, each tagged with its 1-based line number.
fn tokenize(text: &str, name: &str) -> Result<Vec<(usize, Vec<f64>)>, ResourceError> {
    let mut rows = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<f64>().map_err(|_| ResourceError::Parse {
                    name: name.to_string(),
                    line: i + 1,
                    token: t.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push((i + 1, values));
    }
    Ok(rows)
}

/// Parse a two-column `x y` resource into a curve.
pub fn parse_curve(text: &str, name: &str) -> Result<TabulatedCurve, ResourceError> {
    let rows = tokenize(text, name)?;
    if rows.is_empty() {
        return Err(ResourceError::Empty {
            name: name.to_string(),
        });
    }

    let mut xs = Vec::with_capacity(rows.len());
    let mut ys = Vec::with_capacity(rows.len());
    for (line, values) in rows {
        if values.len() != 2 {
            return Err(ResourceError::ColumnCount {
                name: name.to_string(),
                line,
                expected: 2,
                found: values.len(),
            });
        }
        xs.push(values[0]);
        ys.push(values[1]);
    }

    TabulatedCurve::new(xs, ys).map_err(|source| ResourceError::Curve {
        name: name.to_string(),
        source,
    })
}

/// Axis length from a grid header, at most `available` values long.
fn axis_length(value: f64, available: usize, name: &str) -> Result<usize, ResourceError> {
    if !(value >= 1.0 && value <= available as f64) || value.fract() != 0.0 {
        return Err(ResourceError::AxisLength {
            name: name.to_string(),
            value,
        });
    }
    Ok(value as usize)
}

/// Parse a 2D grid resource (`nx ny`, x axis, y axis, row-major table).
pub fn parse_grid(text: &str, name: &str) -> Result<Grid2D, ResourceError> {
    let values: Vec<f64> = tokenize(text, name)?
        .into_iter()
        .flat_map(|(_, v)| v)
        .collect();
    if values.len() < 2 {
        return Err(ResourceError::Empty {
            name: name.to_string(),
        });
    }

    let available = values.len() - 2;
    let nx = axis_length(values[0], available, name)?;
    let ny = axis_length(values[1], available, name)?;
    let expected = nx
        .checked_mul(ny)
        .and_then(|cells| cells.checked_add(2 + nx + ny));
    if expected != Some(values.len()) {
        return Err(ResourceError::ValueCount {
            name: name.to_string(),
            expected: expected.unwrap_or(usize::MAX),
            found: values.len(),
        });
    }

    let x_axis = values[2..2 + nx].to_vec();
    let y_axis = values[2 + nx..2 + nx + ny].to_vec();
    let table = values[2 + nx + ny..].to_vec();

    Grid2D::from_row_major(x_axis, y_axis, table).map_err(|source| ResourceError::Grid {
        name: name.to_string(),
        source,
    })
}

/// Read-once cache of named curves and grids under a data root.
#[derive(Debug)]
pub struct ResourceLibrary {
    root: PathBuf,
    curves: RwLock<HashMap<String, Arc<TabulatedCurve>>>,
    grids: RwLock<HashMap<String, Arc<Grid2D>>>,
}

impl ResourceLibrary {
    /// Create a library resolving names relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            curves: RwLock::new(HashMap::new()),
            grids: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, name: &str) -> Result<String, ResourceError> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path).map_err(|source| ResourceError::Io {
            name: name.to_string(),
            source,
        })
    }

    /// Register an in-memory curve under `name`, replacing any cached entry.
    pub fn insert_curve(&self, name: impl Into<String>, curve: TabulatedCurve) -> Arc<TabulatedCurve> {
        let curve = Arc::new(curve);
        self.curves
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), Arc::clone(&curve));
        curve
    }

    /// Register an in-memory grid under `name`, replacing any cached entry.
    pub fn insert_grid(&self, name: impl Into<String>, grid: Grid2D) -> Arc<Grid2D> {
        let grid = Arc::new(grid);
        self.grids
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), Arc::clone(&grid));
        grid
    }

    /// Fetch a 1D curve, loading it on first use.
    pub fn curve(&self, name: &str) -> Result<Arc<TabulatedCurve>, ResourceError> {
        if let Some(curve) = self
            .curves
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
        {
            return Ok(Arc::clone(curve));
        }

        let curve = parse_curve(&self.read(name)?, name)?;
        debug!(
            "Loaded curve {name}: {} rows over [{}, {}]",
            curve.len(),
            curve.x_min(),
            curve.x_max()
        );

        let mut cache = self.curves.write().unwrap_or_else(|e| e.into_inner());
        let entry = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(curve));
        Ok(Arc::clone(entry))
    }

    /// Fetch a 2D grid, loading it on first use.
    pub fn grid(&self, name: &str) -> Result<Arc<Grid2D>, ResourceError> {
        if let Some(grid) = self
            .grids
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
        {
            return Ok(Arc::clone(grid));
        }

        let grid = parse_grid(&self.read(name)?, name)?;
        debug!(
            "Loaded grid {name}: {} x {}",
            grid.x_axis().len(),
            grid.y_axis().len()
        );

        let mut cache = self.grids.write().unwrap_or_else(|e| e.into_inner());
        let entry = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(grid));
        Ok(Arc::clone(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_curve_with_comments() {
        let text = "# wavelength transmission\n\n400 0.5\n500, 0.75\n  600\t1.0\n";
        let curve = parse_curve(text, "t.dat").unwrap();
        assert_eq!(curve.len(), 3);
        assert_relative_eq!(curve.value_at(450.0), 0.625, epsilon = 1e-12);
    }

    #[test]
    fn test_parse_curve_errors() {
        assert!(matches!(
            parse_curve("# nothing\n", "empty.dat"),
            Err(ResourceError::Empty { .. })
        ));
        assert!(matches!(
            parse_curve("1 2 3\n", "wide.dat"),
            Err(ResourceError::ColumnCount { line: 1, found: 3, .. })
        ));
        assert!(matches!(
            parse_curve("1 2\n2 abc\n", "bad.dat"),
            Err(ResourceError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_curve("2 1\n1 1\n", "order.dat"),
            Err(ResourceError::Curve { .. })
        ));
    }

    #[test]
    fn test_parse_grid() {
        let text = "3 2\n0.0 1.0 2.0\n10.0 20.0\n1 2 3\n4 5 6\n";
        let grid = parse_grid(text, "g.dat").unwrap();
        assert_eq!(grid.x_axis(), &[0.0, 1.0, 2.0]);
        assert_eq!(grid.y_axis(), &[10.0, 20.0]);
        assert_eq!(grid.value(2, 0), 3.0);
        assert_eq!(grid.value(0, 1), 4.0);
    }

    #[test]
    fn test_parse_grid_errors() {
        assert!(matches!(
            parse_grid("2 2\n0 1\n0 1\n1 2 3\n", "short.dat"),
            Err(ResourceError::ValueCount { expected: 10, found: 9, .. })
        ));
        assert!(matches!(
            parse_grid("2.5 2\n", "frac.dat"),
            Err(ResourceError::AxisLength { .. })
        ));
        assert!(matches!(
            parse_grid("2e19 2\n0 1\n", "huge.dat"),
            Err(ResourceError::AxisLength { .. })
        ));
        assert!(matches!(
            parse_grid("3 2\n0 nan 2\n0 1\n1 1 1 1 1 1\n", "nan.dat"),
            Err(ResourceError::Grid { .. })
        ));
        assert!(matches!(
            parse_grid("2 1\n1 0\n0\n1 2\n", "order.dat"),
            Err(ResourceError::Grid { .. })
        ));
    }

    #[test]
    fn test_library_caches_and_shares() {
        let library = ResourceLibrary::new("/nonexistent");
        let curve = TabulatedCurve::new(vec![1.0, 2.0], vec![3.0, 4.0]).unwrap();
        library.insert_curve("mem.dat", curve);

        let a = library.curve("mem.dat").unwrap();
        let b = library.curve("mem.dat").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_library_serves_inserted_grid() {
        let library = ResourceLibrary::new("/nonexistent");
        let grid =
            Grid2D::from_row_major(vec![0.0, 1.0], vec![0.0, 1.0], vec![1.0, 2.0, 3.0, 4.0])
                .unwrap();
        let inserted = library.insert_grid("mem_grid.dat", grid);
        assert!(Arc::ptr_eq(&inserted, &library.grid("mem_grid.dat").unwrap()));
    }

    #[test]
    fn test_library_missing_file() {
        let library = ResourceLibrary::new("/nonexistent");
        assert!(matches!(
            library.curve("missing.dat"),
            Err(ResourceError::Io { .. })
        ));
        assert!(matches!(
            library.grid("missing.dat"),
            Err(ResourceError::Io { .. })
        ));
    }

    #[test]
    fn test_library_reads_from_disk() {
        let dir = std::env::temp_dir().join("itc_resource_library_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("curve.dat"), "1 0\n3 1\n").unwrap();

        let library = ResourceLibrary::new(&dir);
        let curve = library.curve("curve.dat").unwrap();
        assert_relative_eq!(curve.value_at(2.0), 0.5, epsilon = 1e-12);
    }
}
