//! Cosmological redshift of a source spectrum.

use super::{PipelineError, SpectrumTransform};
use crate::photometry::SampledSpectrum;

/// Redshifts below this magnitude leave the spectrum untouched.
pub const MIN_REDSHIFT: f64 = 1e-4;

/// Redshifts at or below this value are rejected as unphysical.
pub const MAX_BLUESHIFT: f64 = -0.9;

/// Stretches the wavelength axis by `1 + z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redshift {
    z: f64,
}

impl Redshift {
    /// Create a redshift unit, rejecting `z <= -0.9`.
    pub fn new(z: f64) -> Result<Self, PipelineError> {
        if !(z > MAX_BLUESHIFT) {
            return Err(PipelineError::UnphysicalRedshift(z));
        }
        Ok(Self { z })
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Observed wavelength of light emitted at `rest_nm`.
    pub fn observed(&self, rest_nm: f64) -> f64 {
        rest_nm * (1.0 + self.z)
    }
}

impl SpectrumTransform for Redshift {
    fn name(&self) -> String {
        format!("redshift z={}", self.z)
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        if self.z.abs() < MIN_REDSHIFT {
            return Ok(());
        }
        sed.rescale_x(1.0 + self.z)?;
        Ok(())
    }
}
