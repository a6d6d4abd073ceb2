//! Imaging noise budget and exposure-time solver.
//!
//! Rates are in electrons per second after every transmission and the
//! detector response: the source rate is the total inside the filter and
//! the sky rate is per arcsec².

use log::{debug, warn};
use serde::Serialize;

use super::{CalcError, SourceFraction};
use crate::hardware::DetectorConfig;

/// Variances of a single exposure, in e⁻².
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseBudget {
    pub var_source: f64,
    pub var_background: f64,
    pub var_dark: f64,
    pub var_readout: f64,
    /// Source electrons in the aperture
    pub signal: f64,
}

impl NoiseBudget {
    pub fn noise(&self) -> f64 {
        (self.var_source + self.var_background + self.var_dark + self.var_readout).sqrt()
    }

    /// Noise of an aperture with no source in it.
    pub fn sourceless_noise(&self) -> f64 {
        (self.var_background + self.var_dark + self.var_readout).sqrt()
    }

    /// Zero when there is neither signal nor noise.
    pub fn s2n(&self) -> f64 {
        let noise = self.noise();
        if noise > 0.0 {
            self.signal / noise
        } else {
            0.0
        }
    }

    /// Sky noise exceeds the detector's dark and read noise.
    pub fn is_background_limited(&self) -> bool {
        self.var_background > self.var_dark + self.var_readout
    }

    /// Human-readable note on the dominant noise term.
    pub fn background_advisory(&self) -> String {
        if self.is_background_limited() {
            "The observation is background limited.".to_string()
        } else {
            "The observation is not background limited; dark current and read noise dominate \
             the sky."
                .to_string()
        }
    }
}

/// Secondary (AO halo) component of the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaloTerm {
    pub integral: f64,
    pub source_fraction: f64,
}

/// Imaging signal-to-noise calculator for one aperture.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagingS2N {
    sed_integral: f64,
    sky_integral: f64,
    halo: Option<HaloTerm>,
    aperture: SourceFraction,
    pixel_size: f64,
    dark_current: f64,
    read_noise: f64,
    elfn: f64,
}

impl ImagingS2N {
    /// `sed_integral` in e⁻/s, `sky_integral` in e⁻/s/arcsec².
    pub fn new(
        sed_integral: f64,
        sky_integral: f64,
        aperture: SourceFraction,
        detector: &DetectorConfig,
    ) -> Self {
        Self {
            sed_integral,
            sky_integral,
            halo: None,
            aperture,
            pixel_size: detector.binned_pixel_size(),
            dark_current: detector.binned_dark_current(),
            read_noise: detector.read_noise_e,
            elfn: 1.0,
        }
    }

    pub fn with_halo(mut self, integral: f64, source_fraction: f64) -> Self {
        self.halo = Some(HaloTerm {
            integral,
            source_fraction,
        });
        self
    }

    /// Excess low-flux noise factor applied to shot noise.
    pub fn with_elfn(mut self, elfn: f64) -> Self {
        self.elfn = elfn;
        self
    }

    pub fn aperture(&self) -> &SourceFraction {
        &self.aperture
    }

    /// Source electrons per second inside the aperture.
    pub fn signal_rate(&self) -> f64 {
        let halo = self
            .halo
            .map(|h| h.integral * h.source_fraction)
            .unwrap_or(0.0);
        self.sed_integral * self.aperture.source_fraction + halo
    }

    /// Sky electrons per second inside the aperture.
    pub fn background_rate(&self) -> f64 {
        self.sky_integral * self.pixel_size * self.pixel_size * self.aperture.enclosed_pixels
    }

    pub fn dark_rate(&self) -> f64 {
        self.dark_current * self.aperture.enclosed_pixels
    }

    /// Read-noise variance of one read of the whole aperture.
    pub fn read_variance(&self) -> f64 {
        self.read_noise * self.read_noise * self.aperture.enclosed_pixels
    }

    /// Noise budget of one exposure of `exposure_time` seconds.
    pub fn noise_budget(&self, exposure_time: f64) -> NoiseBudget {
        let signal = self.signal_rate() * exposure_time;
        let budget = NoiseBudget {
            var_source: signal * self.elfn,
            var_background: self.background_rate() * exposure_time * self.elfn,
            var_dark: self.dark_rate() * exposure_time,
            var_readout: self.read_variance(),
            signal,
        };
        debug!(
            "Imaging noise budget for {exposure_time} s: source {:.3e}, background {:.3e}, \
             dark {:.3e}, readout {:.3e}",
            budget.var_source, budget.var_background, budget.var_dark, budget.var_readout
        );
        budget
    }

    /// S/N of the whole observation.
    ///
    /// Only `exposures × frac_with_source` frames contain the source, and
    /// sky subtraction through an aperture `sky_aperture` times the source
    /// aperture inflates the sourceless noise by `1 + 1/sky_aperture`.
    pub fn total_s2n(
        &self,
        budget: &NoiseBudget,
        exposures: u32,
        frac_with_source: f64,
        sky_aperture: f64,
    ) -> Result<f64, CalcError> {
        if !(sky_aperture > 0.0) {
            return Err(CalcError::InvalidObservation(format!(
                "sky aperture must be positive, got {sky_aperture}"
            )));
        }
        let source_exposures = super::check_source_fraction(exposures, frac_with_source)?;
        let noise_factor = 1.0 + 1.0 / sky_aperture;
        let sourceless = budget.sourceless_noise();
        let noise = (budget.signal + noise_factor * sourceless * sourceless).sqrt();
        if !(noise > 0.0) {
            return Ok(0.0);
        }
        Ok(source_exposures.sqrt() * budget.signal / noise)
    }

    /// Peak pixel flux check against the detector's linear range.
    ///
    /// Returns a warning when `peak_flux` exceeds the acceptable maximum.
    /// Nothing is corrected.
    pub fn saturation_advisory(peak_flux: f64, detector: &DetectorConfig) -> Option<String> {
        let limit = detector.max_acceptable_flux();
        if peak_flux > limit {
            warn!("Peak pixel flux {peak_flux:.0} e- exceeds {limit:.0} e-");
            Some(format!(
                "Warning: peak pixel flux {peak_flux:.0} e- exceeds the detector's maximum \
                 acceptable flux of {limit:.0} e-; the source may saturate."
            ))
        } else {
            None
        }
    }
}

/// Exposure time needed to reach a target S/N.
#[derive(Debug, Clone, Copy)]
pub struct ExposureTimeSolver<'a> {
    s2n: &'a ImagingS2N,
}

impl<'a> ExposureTimeSolver<'a> {
    pub fn new(s2n: &'a ImagingS2N) -> Self {
        Self { s2n }
    }

    /// Root of `a·t² + b·t + c = 0` with
    /// `a = rate²`, `b = -S²(rate + background + dark)`, `c = S²·readout`.
    ///
    /// Takes the `+` root. A non-positive discriminant falls back to one
    /// second.
    pub fn solve(&self, target_s2n: f64) -> f64 {
        let rate = self.s2n.signal_rate();
        let s2 = target_s2n * target_s2n;
        let a = rate * rate;
        let b = -s2
            * (rate * self.s2n.elfn
                + self.s2n.background_rate() * self.s2n.elfn
                + self.s2n.dark_rate());
        let c = s2 * self.s2n.read_variance();

        let discriminant = b * b - 4.0 * a * c;
        if discriminant <= 0.0 || a <= 0.0 {
            warn!("No exposure time reaches S/N {target_s2n}; using 1 s");
            return 1.0;
        }
        let t = (-b + discriminant.sqrt()) / (2.0 * a);
        debug!("Exposure time for S/N {target_s2n}: {t:.3} s");
        t
    }
}
