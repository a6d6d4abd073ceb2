//! Flux normalization to a requested source brightness.

use log::debug;

use super::{PipelineError, SpectrumTransform};
use crate::photometry::{BrightnessUnit, SampledSpectrum, Waveband};

/// Rescales a spectrum so its mean over a waveband matches a brightness.
///
/// The brightness is converted to a photon flux density with
/// [`BrightnessUnit::photon_flux`], then the whole spectrum is multiplied
/// by `target / mean(band)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    band: Waveband,
    brightness: f64,
    unit: BrightnessUnit,
}

impl Normalize {
    pub fn new(band: Waveband, brightness: f64, unit: BrightnessUnit) -> Self {
        Self {
            band,
            brightness,
            unit,
        }
    }

    /// Like [`Normalize::new`], parsing the unit from its request code.
    pub fn from_code(band: Waveband, brightness: f64, unit: &str) -> Result<Self, PipelineError> {
        Ok(Self::new(band, brightness, unit.parse()?))
    }

    /// Target mean photon flux density over the band.
    pub fn target_flux(&self) -> f64 {
        self.unit.photon_flux(self.brightness, &self.band)
    }
}

impl SpectrumTransform for Normalize {
    fn name(&self) -> String {
        format!(
            "normalize to {} {} over [{}, {}] nm",
            self.brightness, self.unit, self.band.start_nm, self.band.end_nm
        )
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        if !sed.covers(self.band.start_nm, self.band.end_nm) {
            return Err(PipelineError::BandNotCovered {
                band_start: self.band.start_nm,
                band_end: self.band.end_nm,
                sed_start: sed.start(),
                sed_end: sed.end(),
            });
        }

        let average = sed.average_between(self.band.start_nm, self.band.end_nm)?;
        if !(average > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "spectrum has no flux in normalization band [{}, {}] nm",
                self.band.start_nm, self.band.end_nm
            )));
        }

        let target = self.target_flux();
        debug!("Normalization: band mean {average:.4e}, target {target:.4e}");
        sed.rescale_y(target / average);
        Ok(())
    }
}
