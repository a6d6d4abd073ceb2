//! Delivered image quality.

use serde::{Deserialize, Serialize};

/// Reference wavelength at which seeing is quoted, in nm.
pub const SEEING_REFERENCE_NM: f64 = 500.0;

/// How the image FWHM is specified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageQuality {
    /// FWHM in arcsec at the observed wavelength
    Fwhm { arcsec: f64 },
    /// Zenith seeing FWHM in arcsec at 500 nm
    Seeing { arcsec: f64 },
}

impl ImageQuality {
    /// FWHM in arcsec delivered at `wavelength_nm` through `airmass`.
    ///
    /// Seeing grows as `airmass^0.6` and shrinks with wavelength as
    /// `λ^-0.2` (Kolmogorov turbulence).
    pub fn fwhm(&self, airmass: f64, wavelength_nm: f64) -> f64 {
        match *self {
            ImageQuality::Fwhm { arcsec } => arcsec,
            ImageQuality::Seeing { arcsec } => {
                arcsec * airmass.powf(0.6) * (wavelength_nm / SEEING_REFERENCE_NM).powf(-0.2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direct_fwhm_ignores_conditions() {
        let iq = ImageQuality::Fwhm { arcsec: 0.7 };
        assert_eq!(iq.fwhm(2.0, 2200.0), 0.7);
    }

    #[test]
    fn test_seeing_scaling() {
        let iq = ImageQuality::Seeing { arcsec: 0.8 };
        assert_relative_eq!(iq.fwhm(1.0, 500.0), 0.8);
        assert_relative_eq!(iq.fwhm(2.0, 500.0), 0.8 * 2f64.powf(0.6));
        assert!(iq.fwhm(1.0, 2200.0) < 0.8);
        assert_relative_eq!(iq.fwhm(1.0, 16000.0), 0.4, epsilon = 1e-12);
    }
}
