//! Scaling by telescope collecting area.

use super::{PipelineError, SpectrumTransform};
use crate::hardware::TelescopeConfig;
use crate::photometry::SampledSpectrum;

/// Multiplies a per-square-metre flux by the telescope's collecting area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelescopeAperture {
    area_m2: f64,
}

impl TelescopeAperture {
    pub fn new(telescope: &TelescopeConfig) -> Self {
        Self {
            area_m2: telescope.collecting_area_m2(),
        }
    }

    pub fn area_m2(&self) -> f64 {
        self.area_m2
    }
}

impl SpectrumTransform for TelescopeAperture {
    fn name(&self) -> String {
        format!("telescope aperture {:.3} m²", self.area_m2)
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        sed.rescale_y(self.area_m2);
        Ok(())
    }
}
