//! Foreground dust extinction.

use super::{PipelineError, SpectrumTransform};
use crate::photometry::SampledSpectrum;

/// Grey dust screen with visual extinction `Av` magnitudes.
///
/// Every sample is attenuated by `10^(-0.4 Av)`; the extinction law is
/// flat in wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DustScreen {
    av: f64,
}

impl DustScreen {
    pub fn new(av: f64) -> Self {
        Self { av }
    }

    /// Multiplicative attenuation applied to each sample.
    pub fn attenuation(&self) -> f64 {
        10f64.powf(-0.4 * self.av)
    }
}

impl SpectrumTransform for DustScreen {
    fn name(&self) -> String {
        format!("dust screen Av={}", self.av)
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        sed.rescale_y(self.attenuation());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_attenuation() {
        assert_eq!(DustScreen::new(0.0).attenuation(), 1.0);
        assert_relative_eq!(DustScreen::new(2.5).attenuation(), 0.1, epsilon = 1e-15);

        let mut sed = SampledSpectrum::new(vec![10.0, 20.0], 500.0, 1.0).unwrap();
        sed.accept(&DustScreen::new(5.0)).unwrap();
        assert_relative_eq!(sed.y(0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(sed.y(1), 0.2, epsilon = 1e-12);
    }
}
