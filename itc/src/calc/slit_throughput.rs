//! Fraction of a source's flux passing a spectrograph slit.
//!
//! The throughput grid is indexed by a spatial ratio (extraction length
//! divided by slit width) on X and a spectral ratio (slit width divided by
//! the image sigma) on Y.

use shared::algo::grid2d::Grid2D;
use shared::resource::ResourceLibrary;
use std::sync::Arc;

use super::{ApertureChoice, CalcError, FWHM_TO_SIGMA};

/// Resource holding the slit-throughput grid.
pub const SLIT_THROUGHPUT_RESOURCE: &str = "calc/slit_throughput.dat";

/// Optimum extraction aperture, in units of image quality.
pub const OPTIMUM_APERTURE_FACTOR: f64 = 1.4;

/// How far below the grid's X maximum an oversized spatial ratio lands.
const SPATIAL_RATIO_MARGIN: f64 = 0.001;

/// Slit losses as seen by the spectroscopic engine.
pub trait SlitFraction {
    /// Fraction of flux inside the extraction aperture.
    fn throughput(&self) -> f64;

    /// Fraction of flux inside a single spatial pixel.
    fn one_pixel_throughput(&self) -> f64;

    /// Extraction length along the slit, in pixels.
    fn spatial_pixels(&self) -> f64;
}

/// Number of whole pixels in `aperture` arcsec, rounded half up.
fn whole_pixels(aperture: f64, pixel_size: f64) -> f64 {
    (aperture / pixel_size + 0.5).floor()
}

/// Throughput of a compact source through a slit.
#[derive(Debug, Clone)]
pub struct SlitThroughput {
    grid: Arc<Grid2D>,
    image_quality: f64,
    aperture: f64,
    pixel_size: f64,
    slit_width: f64,
}

impl SlitThroughput {
    /// Extraction over `1.4 × image_quality`.
    pub fn optimum(grid: Arc<Grid2D>, image_quality: f64, pixel_size: f64, slit_width: f64) -> Self {
        Self {
            grid,
            image_quality,
            aperture: OPTIMUM_APERTURE_FACTOR * image_quality,
            pixel_size,
            slit_width,
        }
    }

    /// Extraction over a user aperture in arcsec.
    pub fn user_defined(
        grid: Arc<Grid2D>,
        image_quality: f64,
        aperture: f64,
        pixel_size: f64,
        slit_width: f64,
    ) -> Self {
        Self {
            grid,
            image_quality,
            aperture,
            pixel_size,
            slit_width,
        }
    }

    /// Build for an aperture choice, loading the grid from the library.
    pub fn from_library(
        library: &ResourceLibrary,
        aperture: ApertureChoice,
        image_quality: f64,
        pixel_size: f64,
        slit_width: f64,
    ) -> Result<Self, CalcError> {
        if !(pixel_size > 0.0 && slit_width > 0.0 && image_quality > 0.0) {
            return Err(CalcError::InvalidGeometry(format!(
                "slit width {slit_width}, pixel size {pixel_size} and image quality \
                 {image_quality} must be positive"
            )));
        }
        let grid = library.grid(SLIT_THROUGHPUT_RESOURCE)?;
        Ok(match aperture {
            ApertureChoice::Auto => Self::optimum(grid, image_quality, pixel_size, slit_width),
            ApertureChoice::User { diameter_arcsec } => {
                Self::user_defined(grid, image_quality, diameter_arcsec, pixel_size, slit_width)
            }
        })
    }

    /// Spatial ratio for an extraction of `spatial_pixels` pixels.
    pub fn spatial_ratio(&self, spatial_pixels: f64) -> f64 {
        let ratio = spatial_pixels * self.pixel_size / self.slit_width;
        let max = self.grid.x_max();
        if ratio > max {
            max - SPATIAL_RATIO_MARGIN
        } else {
            ratio
        }
    }

    pub fn spectral_ratio(&self) -> f64 {
        self.slit_width / (self.image_quality / FWHM_TO_SIGMA)
    }

    fn throughput_for(&self, spatial_pixels: f64) -> f64 {
        let spectral = self.spectral_ratio();
        if spectral > self.grid.y_max() {
            return 1.0;
        }
        self.lookup(self.spatial_ratio(spatial_pixels), spectral).min(1.0)
    }

    /// Grid lookup with the throughput table's edge rules.
    ///
    /// Below either axis the throughput is 0 and above the spectral axis
    /// it is 1. On the last spectral row the result is 1; on the last
    /// spatial column the value scales with the spectral ratio.
    fn lookup(&self, x: f64, y: f64) -> f64 {
        let grid = &self.grid;
        let (Some(lx), Some(ly)) = (
            Grid2D::bracket(grid.x_axis(), x),
            Grid2D::bracket(grid.y_axis(), y),
        ) else {
            return 0.0;
        };
        if y > grid.y_max() || ly == grid.y_axis().len() - 1 {
            return 1.0;
        }
        if lx == grid.x_axis().len() - 1 {
            return grid.value(lx, ly) * (y / grid.y_axis()[ly]);
        }
        grid.interpolate_cell(lx, ly, x, y)
    }
}

impl SlitFraction for SlitThroughput {
    fn throughput(&self) -> f64 {
        self.throughput_for(self.spatial_pixels())
    }

    fn one_pixel_throughput(&self) -> f64 {
        self.throughput_for(1.0)
    }

    fn spatial_pixels(&self) -> f64 {
        whole_pixels(self.aperture, self.pixel_size)
    }
}

/// Uniform surface brightness source filling the slit.
///
/// The "throughput" is the sky area in arcsec² covered by the extraction,
/// which turns a flux per arcsec² into a flux.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSlitThroughput {
    spatial_pixels: f64,
    pixel_size: f64,
    slit_width: f64,
    area: f64,
}

impl UniformSlitThroughput {
    pub fn new(aperture: ApertureChoice, pixel_size: f64, slit_width: f64) -> Self {
        match aperture {
            ApertureChoice::User { diameter_arcsec } => {
                let spatial_pixels = whole_pixels(diameter_arcsec, pixel_size);
                Self {
                    spatial_pixels,
                    pixel_size,
                    slit_width,
                    area: slit_width * spatial_pixels * pixel_size,
                }
            }
            // Enough pixels to cover one square arcsec
            ApertureChoice::Auto => Self {
                spatial_pixels: (1.0 / (slit_width * pixel_size) + 0.5).floor(),
                pixel_size,
                slit_width,
                area: 1.0,
            },
        }
    }
}

impl SlitFraction for UniformSlitThroughput {
    fn throughput(&self) -> f64 {
        self.area
    }

    fn one_pixel_throughput(&self) -> f64 {
        self.slit_width * self.pixel_size
    }

    fn spatial_pixels(&self) -> f64 {
        self.spatial_pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 3×3 grid, x = 1..3, y = 1..3, value = x·y / 10
    fn grid() -> Arc<Grid2D> {
        let axis = vec![1.0, 2.0, 3.0];
        let values: Vec<f64> = (1..=3)
            .flat_map(|y| (1..=3).map(move |x| (x * y) as f64 / 10.0))
            .collect();
        Arc::new(Grid2D::from_row_major(axis.clone(), axis, values).unwrap())
    }

    fn slit(aperture: f64, pixel_size: f64, slit_width: f64, iq: f64) -> SlitThroughput {
        SlitThroughput::user_defined(grid(), iq, aperture, pixel_size, slit_width)
    }

    #[test]
    fn test_spatial_pixels_round_half_up() {
        assert_eq!(slit(1.0, 0.4, 1.0, 1.0).spatial_pixels(), 3.0);
        assert_eq!(slit(0.9, 0.4, 1.0, 1.0).spatial_pixels(), 2.0);
        let optimum = SlitThroughput::optimum(grid(), 0.5, 0.1, 1.0);
        assert_eq!(optimum.spatial_pixels(), 7.0);
    }

    #[test]
    fn test_interior_is_bilinear() {
        // spatial 15 × 0.1 / 1.0 = 1.5; spectral 1.0 / (2.355/2.355 · 0.5) = 2.0
        let slit = slit(1.5, 0.1, 1.0, 2.355 / 2.0);
        assert_relative_eq!(slit.spectral_ratio(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(slit.throughput(), 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_spectral_ratio_above_grid_is_one() {
        let slit = slit(1.5, 0.1, 10.0, 0.5);
        assert!(slit.spectral_ratio() > 3.0);
        assert_eq!(slit.throughput(), 1.0);
        assert_eq!(slit.one_pixel_throughput(), 1.0);
    }

    #[test]
    fn test_below_grid_is_zero() {
        // One pixel of 0.1" through a 1" slit: spatial ratio 0.1 < 1
        let slit = slit(1.5, 0.1, 1.0, 2.355 / 2.0);
        assert_eq!(slit.one_pixel_throughput(), 0.0);
    }

    #[test]
    fn test_oversized_spatial_ratio_slides_under_max() {
        // spatial 100 × 0.1 / 1 = 10 → 2.999, spectral 2.0
        let slit = slit(10.0, 0.1, 1.0, 2.355 / 2.0);
        assert_relative_eq!(slit.spatial_ratio(100.0), 2.999);
        assert_relative_eq!(slit.throughput(), 2.999 * 2.0 / 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_last_spatial_column_scales() {
        // 3 pixels of 0.5" over a 0.5" slit: spatial ratio 3 is the last column
        let slit = slit(1.5, 0.5, 0.5, 0.785);
        assert_eq!(slit.spatial_ratio(slit.spatial_pixels()), 3.0);
        assert_relative_eq!(slit.spectral_ratio(), 1.5, epsilon = 1e-12);
        assert_relative_eq!(slit.throughput(), 0.3 * 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_result_clamped_to_one() {
        let big = Arc::new(
            Grid2D::from_row_major(vec![1.0, 2.0], vec![1.0, 2.0], vec![2.0; 4]).unwrap(),
        );
        let slit = SlitThroughput::user_defined(big, 2.355 / 1.5, 1.5, 0.1, 1.0);
        assert_eq!(slit.throughput(), 1.0);
    }

    #[test]
    fn test_uniform_user_aperture() {
        let uniform = UniformSlitThroughput::new(
            ApertureChoice::User {
                diameter_arcsec: 1.0,
            },
            0.1,
            0.5,
        );
        assert_eq!(uniform.spatial_pixels(), 10.0);
        assert_relative_eq!(uniform.throughput(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(uniform.one_pixel_throughput(), 0.05);
    }

    #[test]
    fn test_uniform_auto_aperture() {
        let uniform = UniformSlitThroughput::new(ApertureChoice::Auto, 0.1, 0.5);
        assert_eq!(uniform.spatial_pixels(), 20.0);
        assert_eq!(uniform.throughput(), 1.0);
    }
}
