//! Spectroscopic signal-to-noise engine.
//!
//! [`SpecS2N::run`] goes through three phases on spectra it owns:
//!
//! 1. smooth the source, background and optional halo to the instrument
//!    resolution and resample them onto the detector pixel grid, padding
//!    with zero outside the input spectra;
//! 2. compute per-pixel signal, background and the single-exposure and
//!    final S/N through the slit-integrated throughput;
//! 3. recompute signal and √background through a single spatial pixel,
//!    for plotting.
//!
//! Per-pixel loops honour the detector's usable CCD pixel range; pixels
//! outside it are zero in every output.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{check_source_fraction, CalcError, SlitFraction};
use crate::hardware::DetectorConfig;
use crate::photometry::SampledSpectrum;
use crate::pipeline::{Resample, Smoothing, SpectrumTransform};

/// Grating or prism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disperser {
    pub name: String,
    /// Dispersion in nm per unbinned detector pixel
    pub dispersion_nm: f64,
    /// Resolution element in nm through a [`Disperser::REFERENCE_SLIT_ARCSEC`] slit
    pub resolution_nm: f64,
}

impl Disperser {
    pub const REFERENCE_SLIT_ARCSEC: f64 = 0.5;

    pub fn new(name: impl Into<String>, dispersion_nm: f64, resolution_nm: f64) -> Self {
        Self {
            name: name.into(),
            dispersion_nm,
            resolution_nm,
        }
    }

    /// Resolution element in nm for an illuminated width in arcsec.
    pub fn resolution(&self, width_arcsec: f64) -> f64 {
        self.resolution_nm * width_arcsec / Self::REFERENCE_SLIT_ARCSEC
    }
}

/// Slit as seen by the background calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slit {
    pub width_arcsec: f64,
    pub pixel_size: f64,
    pub length_pixels: f64,
}

impl Slit {
    /// A slit one spatial pixel long.
    pub fn one_pixel(width_arcsec: f64, pixel_size: f64) -> Self {
        Self {
            width_arcsec,
            pixel_size,
            length_pixels: 1.0,
        }
    }

    /// Sky area covered, arcsec²
    pub fn area(&self) -> f64 {
        self.width_arcsec * self.pixel_size * self.length_pixels
    }
}

/// Exposure setup of a spectroscopic observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecExposures {
    /// Seconds per coadd
    pub exposure_time: f64,
    pub coadds: u32,
    pub exposures: u32,
    pub frac_with_source: f64,
}

/// Instrument and observation parameters of a spectroscopic calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSetup {
    pub disperser: Disperser,
    pub slit_width: f64,
    /// Detector wavelength range, nm
    pub wavelength_range: (f64, f64),
    /// Image FWHM of the source core, arcsec
    pub image_quality: f64,
    pub exposures: SpecExposures,
    /// Sky aperture size relative to the source aperture, or IFU sky fibres
    pub sky_aperture: f64,
}

/// Secondary component (AO halo) carried alongside the core.
pub struct HaloComponent {
    pub flux: SampledSpectrum,
    pub throughput: Box<dyn SlitFraction>,
    pub image_quality: f64,
}

/// Output spectra of a spectroscopic calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecS2NResult {
    /// Signal per coadd through one spatial pixel
    pub signal: SampledSpectrum,
    /// √background per coadd through one spatial pixel
    pub sqrt_background: SampledSpectrum,
    /// S/N of one exposure
    pub exp_s2n: SampledSpectrum,
    /// S/N of the whole observation
    pub final_s2n: SampledSpectrum,
    /// Slit-integrated signal per coadd (the source shot-noise variance)
    pub aperture_signal: SampledSpectrum,
    /// Slit-integrated background per coadd
    pub aperture_background: SampledSpectrum,
    /// Noise of one coadd
    pub noise: SampledSpectrum,
    /// Dark current variance per spectral pixel
    pub dark_variance: f64,
    /// Read noise variance per spectral pixel
    pub read_variance: f64,
}

/// Spectroscopic S/N engine for one calculation.
pub struct SpecS2N {
    source: SampledSpectrum,
    background: SampledSpectrum,
    halo: Option<HaloComponent>,
    throughput: Box<dyn SlitFraction>,
    disperser: Disperser,
    slit_width: f64,
    pixel_size: f64,
    pixel_width: f64,
    obs_range: (f64, f64),
    image_quality: f64,
    dark_current: f64,
    read_noise: f64,
    ccd_range: Option<(usize, usize)>,
    exposures: SpecExposures,
    sky_aperture: f64,
}

impl SpecS2N {
    /// `source` in photons/s/nm, `background` in photons/s/nm/arcsec².
    pub fn new(
        source: SampledSpectrum,
        background: SampledSpectrum,
        throughput: Box<dyn SlitFraction>,
        setup: SpecSetup,
        detector: &DetectorConfig,
    ) -> Self {
        Self {
            source,
            background,
            halo: None,
            throughput,
            pixel_width: setup.disperser.dispersion_nm * detector.spectral_binning as f64,
            disperser: setup.disperser,
            slit_width: setup.slit_width,
            pixel_size: detector.binned_pixel_size(),
            obs_range: setup.wavelength_range,
            image_quality: setup.image_quality,
            dark_current: detector.binned_dark_current(),
            read_noise: detector.read_noise_e,
            ccd_range: detector.ccd_pixel_range,
            exposures: setup.exposures,
            sky_aperture: setup.sky_aperture,
        }
    }

    pub fn with_halo(mut self, halo: HaloComponent) -> Self {
        self.halo = Some(halo);
        self
    }

    /// Restrict per-pixel work to detector pixels `[first, last]`.
    pub fn with_ccd_range(mut self, first: usize, last: usize) -> Self {
        self.ccd_range = Some((first, last));
        self
    }

    /// Detector pixel width in nm.
    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    /// Inclusive pixel range for a spectrum of `n` pixels.
    ///
    /// The last pixel defaults to `n - 1` and is capped there.
    pub fn pixel_range(&self, n: usize) -> (usize, usize) {
        let (first, last) = self.ccd_range.unwrap_or((0, usize::MAX));
        (first, last.min(n.saturating_sub(1)))
    }

    fn validate(&self) -> Result<f64, CalcError> {
        let e = &self.exposures;
        if !(e.exposure_time > 0.0) || e.coadds == 0 || !(self.sky_aperture > 0.0) {
            return Err(CalcError::InvalidObservation(format!(
                "exposure time {}, coadds {} and sky aperture {} must be positive",
                e.exposure_time, e.coadds, self.sky_aperture
            )));
        }
        let (start, end) = self.obs_range;
        if !(end > start) || !(self.pixel_width > 0.0) {
            return Err(CalcError::InvalidObservation(format!(
                "wavelength range [{start}, {end}] with pixel width {}",
                self.pixel_width
            )));
        }
        let source_exposures = check_source_fraction(e.exposures, e.frac_with_source)?;
        Ok(source_exposures * e.coadds as f64)
    }

    /// Run all three phases.
    pub fn run(mut self) -> Result<SpecS2NResult, CalcError> {
        let source_exposures = self.validate()?;
        self.resample()?;
        let mut result = self.calculate_s2n(source_exposures);
        let (signal, sqrt_background) = self.calculate_signal();
        result.signal = signal;
        result.sqrt_background = sqrt_background;
        Ok(result)
    }

    fn resample(&mut self) -> Result<(), CalcError> {
        let source_res = self
            .disperser
            .resolution(self.slit_width.min(self.image_quality));
        let background_res = self.disperser.resolution(self.slit_width);
        debug!(
            "Spectral resolution: source {source_res:.7} nm, background {background_res:.7} nm"
        );

        let (start, end) = self.obs_range;
        let resample = Resample::with_padding(start, end, self.pixel_width, 0.0);

        let smoothing = Smoothing::from_resolution(source_res, self.source.sampling());
        debug!("Source {}", smoothing.name());
        self.source.accept(&smoothing)?;
        self.source.accept(&resample)?;

        let smoothing = Smoothing::from_resolution(background_res, self.background.sampling());
        debug!("Background {}", smoothing.name());
        self.background.accept(&smoothing)?;
        self.background.accept(&resample)?;

        if let Some(halo) = self.halo.as_mut() {
            let halo_res = self
                .disperser
                .resolution(self.slit_width.min(halo.image_quality));
            halo.flux
                .accept(&Smoothing::from_resolution(halo_res, halo.flux.sampling()))?;
            halo.flux.accept(&resample)?;
        }
        info!(
            "Resampled to {} detector pixels of {} nm",
            self.source.len(),
            self.pixel_width
        );
        Ok(())
    }

    fn zeroed(&self) -> SampledSpectrum {
        let mut spectrum = self.source.clone();
        spectrum.map_in_place(|_, _| 0.0);
        spectrum
    }

    /// Signal per coadd for the given core and halo throughputs.
    fn signal(&self, throughput: f64, halo_throughput: Option<f64>) -> SampledSpectrum {
        let t = self.exposures.exposure_time;
        let mut signal = self.zeroed();
        let (first, last) = self.pixel_range(signal.len());
        for i in first..=last {
            let mut value = self.source.y(i) * throughput * t * self.pixel_width;
            if let (Some(halo), Some(halo_tp)) = (self.halo.as_ref(), halo_throughput) {
                value += halo.flux.y(i) * halo_tp * t * self.pixel_width;
            }
            signal.set_y(i, value);
        }
        signal
    }

    /// Background per coadd collected through `slit`.
    fn background(&self, slit: &Slit) -> SampledSpectrum {
        let t = self.exposures.exposure_time;
        let mut background = self.zeroed();
        let (first, last) = self.pixel_range(background.len());
        debug!(
            "Background in a {:.2} arcsec² slit on pixels {first}-{last}",
            slit.area()
        );
        for i in first..=last {
            background.set_y(i, self.background.y(i) * slit.area() * t * self.pixel_width);
        }
        background
    }

    fn aperture_slit(&self) -> Slit {
        Slit {
            width_arcsec: self.slit_width,
            pixel_size: self.pixel_size,
            length_pixels: self.throughput.spatial_pixels(),
        }
    }

    fn calculate_s2n(&self, source_exposures: f64) -> SpecS2NResult {
        let slit = self.aperture_slit();
        let t = self.exposures.exposure_time;
        let dark_variance = self.dark_current * slit.length_pixels * t;
        let read_variance = self.read_noise * self.read_noise * slit.length_pixels;
        debug!(
            "Per spectral pixel: dark variance {dark_variance:.3}, read variance {read_variance:.3}"
        );

        let halo_tp = self.halo.as_ref().map(|h| h.throughput.throughput());
        let signal = self.signal(self.throughput.throughput(), halo_tp);
        let background = self.background(&slit);

        let coadds = self.exposures.coadds as f64;
        let noise_factor = 1.0 + 1.0 / self.sky_aperture;

        let mut noise = self.zeroed();
        let mut exp_s2n = self.zeroed();
        let mut final_s2n = self.zeroed();
        let (first, last) = self.pixel_range(signal.len());
        for i in first..=last {
            let s = signal.y(i);
            let sourceless = background.y(i) + dark_variance + read_variance;
            let n = (s + sourceless).sqrt();
            noise.set_y(i, n);
            exp_s2n.set_y(i, safe_ratio(coadds.sqrt() * s, n));
            final_s2n.set_y(
                i,
                safe_ratio(
                    source_exposures.sqrt() * s,
                    (s + noise_factor * sourceless).sqrt(),
                ),
            );
        }

        SpecS2NResult {
            signal: self.zeroed(),
            sqrt_background: self.zeroed(),
            exp_s2n,
            final_s2n,
            aperture_signal: signal,
            aperture_background: background,
            noise,
            dark_variance,
            read_variance,
        }
    }

    fn calculate_signal(&self) -> (SampledSpectrum, SampledSpectrum) {
        debug!("Calculating signal and background in a 1-pixel aperture");
        let halo_tp = self
            .halo
            .as_ref()
            .map(|h| h.throughput.one_pixel_throughput());
        let signal = self.signal(self.throughput.one_pixel_throughput(), halo_tp);

        let mut sqrt_background =
            self.background(&Slit::one_pixel(self.slit_width, self.pixel_size));
        let (first, last) = self.pixel_range(sqrt_background.len());
        for i in first..=last {
            sqrt_background.set_y(i, sqrt_background.y(i).sqrt());
        }
        (signal, sqrt_background)
    }
}

/// `num / den`, zero when there is no noise at all.
fn safe_ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}
