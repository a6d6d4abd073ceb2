//! Boxcar smoothing to the instrument's spectral resolution.

use super::{PipelineError, SpectrumTransform};
use crate::photometry::SampledSpectrum;

/// Samples added to every computed smoothing element.
///
/// Empirical correction required to reproduce reference S/N results. It
/// has no derivation; keep it at exactly one sample.
pub const SMOOTHING_ELEMENT_CORRECTION: usize = 1;

/// Boxcar width in samples for a resolution element of `resolution_nm`.
///
/// `round(resolution / sampling)`, at least 1, plus
/// [`SMOOTHING_ELEMENT_CORRECTION`].
pub fn smoothing_element(resolution_nm: f64, sampling: f64) -> usize {
    let samples = (resolution_nm / sampling).round();
    let samples = if samples < 1.0 { 1 } else { samples as usize };
    samples + SMOOTHING_ELEMENT_CORRECTION
}

/// Boxcar smoothing over a fixed number of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Smoothing {
    element: usize,
}

impl Smoothing {
    pub fn new(element: usize) -> Self {
        Self { element }
    }

    /// Smoothing matched to a resolution element on a grid of `sampling` nm.
    pub fn from_resolution(resolution_nm: f64, sampling: f64) -> Self {
        Self::new(smoothing_element(resolution_nm, sampling))
    }

    pub fn element(&self) -> usize {
        self.element
    }
}

impl SpectrumTransform for Smoothing {
    fn name(&self) -> String {
        format!("boxcar smoothing over {} samples", self.element)
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        sed.smooth_y(self.element);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_always_has_correction() {
        assert_eq!(smoothing_element(1.0, 0.5), 3);
        assert_eq!(smoothing_element(1.26, 0.5), 4);
        assert_eq!(smoothing_element(0.1, 0.5), 2);
        assert_eq!(smoothing_element(0.0, 0.5), 2);
        assert_eq!(Smoothing::from_resolution(2.0, 1.0).element(), 3);
    }

    #[test]
    fn test_smoothing_flattens_step() {
        let mut sed = SampledSpectrum::new(vec![0.0, 0.0, 0.0, 6.0, 6.0, 6.0], 0.0, 1.0).unwrap();
        sed.accept(&Smoothing::new(3)).unwrap();
        assert!(sed.y(2) > 0.0 && sed.y(2) < 6.0);
        assert!(sed.y(3) > 0.0 && sed.y(3) < 6.0);
        assert_eq!(sed.y(0), 0.0);
        assert_eq!(sed.y(5), 6.0);
    }
}
