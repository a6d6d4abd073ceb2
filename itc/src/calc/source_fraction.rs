//! Fraction of source flux and number of pixels inside a software aperture.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::{CalcError, FWHM_TO_SIGMA};

/// Auto aperture diameter for compact sources, in units of image quality.
pub const AUTO_APERTURE_FACTOR: f64 = 1.18;

/// Beyond this many sigma the Gaussian wings are ignored.
pub const GAUSSIAN_CUTOFF_SIGMA: f64 = 5.0;

/// Minimum pixel count of a point-source aperture.
pub const MIN_POINT_PIXELS: f64 = 9.0;

/// Minimum pixel count of a uniform-brightness aperture.
pub const MIN_UNIFORM_PIXELS: f64 = 1.0;

/// Spatial profile of the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceGeometry {
    /// Unresolved source, profile set by image quality alone
    Point,
    /// Resolved Gaussian source of intrinsic FWHM (arcsec)
    Gaussian { fwhm_arcsec: f64 },
    /// Uniform surface brightness, flux given per arcsec²
    Uniform,
}

impl SourceGeometry {
    pub fn is_uniform(&self) -> bool {
        matches!(self, SourceGeometry::Uniform)
    }

    /// Image quality of the source after convolution with its own profile.
    pub fn effective_image_quality(&self, image_quality: f64) -> f64 {
        match self {
            SourceGeometry::Gaussian { fwhm_arcsec } => image_quality.hypot(*fwhm_arcsec),
            _ => image_quality,
        }
    }
}

/// Software aperture selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApertureChoice {
    /// Diameter chosen from the source geometry
    Auto,
    /// Fixed diameter in arcsec
    User { diameter_arcsec: f64 },
}

/// Result of an aperture calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceFraction {
    /// Fraction of flux captured; an area in arcsec² for uniform sources
    pub source_fraction: f64,
    /// Pixels inside the aperture, floored to the geometry's minimum
    pub enclosed_pixels: f64,
    /// Aperture diameter in arcsec
    pub aperture_diameter: f64,
}

/// Aperture calculation for one source geometry.
pub trait SourceFractionCalculator {
    fn calculate(&self) -> Result<SourceFraction, CalcError>;
}

fn check_positive(label: &str, value: f64) -> Result<(), CalcError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::InvalidGeometry(format!(
            "{label} must be positive, got {value}"
        )))
    }
}

fn aperture_diameter(aperture: ApertureChoice, auto: f64) -> Result<f64, CalcError> {
    match aperture {
        ApertureChoice::Auto => Ok(auto),
        ApertureChoice::User { diameter_arcsec } => {
            check_positive("aperture diameter", diameter_arcsec)?;
            Ok(diameter_arcsec)
        }
    }
}

/// Point or Gaussian source measured through a circular aperture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSourceFraction {
    pub aperture: ApertureChoice,
    pub pixel_size: f64,
    /// FWHM of the source image in arcsec
    pub image_quality: f64,
}

impl PointSourceFraction {
    pub fn new(aperture: ApertureChoice, pixel_size: f64, image_quality: f64) -> Self {
        Self {
            aperture,
            pixel_size,
            image_quality,
        }
    }

    /// Enclosed energy of a circular 2D Gaussian within `radius`.
    pub fn gaussian_enclosed(radius: f64, sigma: f64) -> f64 {
        if radius / sigma > GAUSSIAN_CUTOFF_SIGMA {
            return 1.0;
        }
        1.0 - (-radius * radius / (2.0 * sigma * sigma)).exp()
    }
}

impl SourceFractionCalculator for PointSourceFraction {
    fn calculate(&self) -> Result<SourceFraction, CalcError> {
        check_positive("pixel size", self.pixel_size)?;
        check_positive("image quality", self.image_quality)?;

        let diameter = aperture_diameter(self.aperture, AUTO_APERTURE_FACTOR * self.image_quality)?;
        let pixels = PI / 4.0 * (diameter / self.pixel_size).powi(2);
        let sigma = self.image_quality / FWHM_TO_SIGMA;

        Ok(SourceFraction {
            source_fraction: Self::gaussian_enclosed(diameter / 2.0, sigma),
            enclosed_pixels: pixels.max(MIN_POINT_PIXELS),
            aperture_diameter: diameter,
        })
    }
}

/// Uniform surface brightness source.
///
/// The "fraction" is the aperture area in arcsec², which turns a flux per
/// arcsec² into the flux inside the aperture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSourceFraction {
    pub aperture: ApertureChoice,
    pub pixel_size: f64,
}

impl UniformSourceFraction {
    pub fn new(aperture: ApertureChoice, pixel_size: f64) -> Self {
        Self {
            aperture,
            pixel_size,
        }
    }
}

impl SourceFractionCalculator for UniformSourceFraction {
    fn calculate(&self) -> Result<SourceFraction, CalcError> {
        check_positive("pixel size", self.pixel_size)?;

        let (area, diameter) = match self.aperture {
            // One square arcsec
            ApertureChoice::Auto => (1.0, (4.0 / PI).sqrt()),
            ApertureChoice::User { .. } => {
                let d = aperture_diameter(self.aperture, 0.0)?;
                (PI / 4.0 * d * d, d)
            }
        };
        let pixels = area / (self.pixel_size * self.pixel_size);

        Ok(SourceFraction {
            source_fraction: area,
            enclosed_pixels: pixels.max(MIN_UNIFORM_PIXELS),
            aperture_diameter: diameter,
        })
    }
}

/// Pick the calculator for a source geometry.
///
/// Gaussian sources use the point-source calculator with the convolved
/// image quality.
pub fn source_fraction_calculator(
    geometry: SourceGeometry,
    aperture: ApertureChoice,
    pixel_size: f64,
    image_quality: f64,
) -> Box<dyn SourceFractionCalculator> {
    match geometry {
        SourceGeometry::Point | SourceGeometry::Gaussian { .. } => Box::new(PointSourceFraction::new(
            aperture,
            pixel_size,
            geometry.effective_image_quality(image_quality),
        )),
        SourceGeometry::Uniform => Box::new(UniformSourceFraction::new(aperture, pixel_size)),
    }
}
