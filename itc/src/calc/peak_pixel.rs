//! Flux collected by the brightest detector pixel.

use log::debug;
use shared::algo::tabulated::TabulatedCurve;
use shared::resource::ResourceLibrary;
use std::sync::Arc;

use super::CalcError;

/// Resource holding the peak-pixel fraction against FWHM in pixels.
pub const PEAK_PIXEL_RESOURCE: &str = "calc/peak_pixel_fraction.dat";

/// Looked-up fractions above this are treated as garbage and zeroed.
const ANOMALOUS_FRACTION: f64 = 1000.0;

/// Rates feeding a peak-pixel estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRates {
    /// Source photon rate, e⁻/s (total, or per arcsec² for uniform sources)
    pub source: f64,
    /// Sky background rate, e⁻/s/arcsec²
    pub background: f64,
    /// Dark current, e⁻/s/pixel
    pub dark_current: f64,
}

/// Peak-pixel calculator backed by a tabulated fraction curve.
#[derive(Debug, Clone)]
pub struct PeakPixelFlux {
    curve: Arc<TabulatedCurve>,
}

impl PeakPixelFlux {
    pub fn new(curve: Arc<TabulatedCurve>) -> Self {
        Self { curve }
    }

    pub fn from_library(library: &ResourceLibrary) -> Result<Self, CalcError> {
        Ok(Self::new(library.curve(PEAK_PIXEL_RESOURCE)?))
    }

    /// Fraction of a point source landing in the peak pixel.
    ///
    /// Zero outside the tabulated range of `image_quality / pixel_size`.
    pub fn peak_fraction(&self, image_quality: f64, pixel_size: f64) -> f64 {
        let fraction = self.curve.value_at(image_quality / pixel_size);
        if fraction > ANOMALOUS_FRACTION {
            0.0
        } else {
            fraction
        }
    }

    fn sky_and_dark(rates: &PixelRates, pixel_size: f64, exposure_time: f64) -> f64 {
        rates.background * exposure_time * pixel_size * pixel_size
            + rates.dark_current * exposure_time
    }

    /// Electrons in the peak pixel for a compact source.
    pub fn point_source(
        &self,
        image_quality: f64,
        pixel_size: f64,
        exposure_time: f64,
        rates: &PixelRates,
    ) -> f64 {
        let fraction = self.peak_fraction(image_quality, pixel_size);
        let peak = rates.source * fraction * exposure_time
            + Self::sky_and_dark(rates, pixel_size, exposure_time);
        debug!("Peak pixel fraction {fraction:.4}, peak pixel flux {peak:.1} e-");
        peak
    }

    /// Electrons in the peak pixel for a uniform source spread over
    /// `enclosed_pixels` pixels of an aperture of area `source_fraction`.
    pub fn uniform_source(
        pixel_size: f64,
        exposure_time: f64,
        rates: &PixelRates,
        source_fraction: f64,
        enclosed_pixels: f64,
    ) -> f64 {
        rates.source * source_fraction * exposure_time / enclosed_pixels
            + Self::sky_and_dark(rates, pixel_size, exposure_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn calculator() -> PeakPixelFlux {
        PeakPixelFlux::new(Arc::new(
            TabulatedCurve::new(vec![1.0, 2.0, 4.0], vec![0.6, 0.3, 0.1]).unwrap(),
        ))
    }

    #[test]
    fn test_point_source_sum() {
        let rates = PixelRates {
            source: 1000.0,
            background: 50.0,
            dark_current: 0.5,
        };
        // iq/pix = 2 → fraction 0.3
        let peak = calculator().point_source(0.2, 0.1, 10.0, &rates);
        assert_relative_eq!(peak, 1000.0 * 0.3 * 10.0 + 50.0 * 10.0 * 0.01 + 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fraction_outside_curve_is_zero() {
        let calc = calculator();
        assert_eq!(calc.peak_fraction(0.05, 0.1), 0.0);
        assert_eq!(calc.peak_fraction(1.0, 0.1), 0.0);
        assert_relative_eq!(calc.peak_fraction(0.3, 0.1), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_anomalous_fraction_zeroed() {
        let calc = PeakPixelFlux::new(Arc::new(
            TabulatedCurve::new(vec![1.0, 2.0], vec![5000.0, 5000.0]).unwrap(),
        ));
        assert_eq!(calc.peak_fraction(1.5, 1.0), 0.0);
    }

    #[test]
    fn test_uniform_source_spreads_flux() {
        let rates = PixelRates {
            source: 100.0,
            background: 0.0,
            dark_current: 0.0,
        };
        let peak = PeakPixelFlux::uniform_source(0.1, 2.0, &rates, 1.0, 100.0);
        assert_relative_eq!(peak, 2.0);
    }
}
