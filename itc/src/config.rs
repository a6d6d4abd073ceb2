//! Calculation request model.
//!
//! A request is plain data: source, conditions, hardware, calculation
//! method and analysis aperture. It round-trips through JSON so that
//! requests can be stored next to their results.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calc::{ApertureChoice, Disperser, ImageQuality, SourceGeometry, SpecExposures};
use crate::hardware::{DetectorConfig, TelescopeConfig};
use crate::photometry::{SedTemplate, StandardBand};

fn one() -> f64 {
    1.0
}

fn default_sampling() -> f64 {
    0.5
}

fn default_sky_aperture() -> f64 {
    5.0
}

fn default_atmosphere() -> String {
    "atmosphere/skytrans".to_string()
}

fn default_sky_background() -> String {
    "sky/sky_background.dat".to_string()
}

/// What is being observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub sed: SedTemplate,
    pub geometry: SourceGeometry,
    /// Brightness in `unit` over `band`
    pub brightness: f64,
    /// Brightness unit code, e.g. `mag` or `jy_psa`
    pub unit: String,
    pub band: StandardBand,
    #[serde(default)]
    pub redshift: f64,
    /// Visual extinction in magnitudes
    #[serde(default)]
    pub extinction_av: f64,
}

/// Sky and seeing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservingConditions {
    pub airmass: f64,
    pub image_quality: ImageQuality,
    /// Base name of the airmass-bucketed transmission resources
    #[serde(default = "default_atmosphere")]
    pub atmosphere: String,
    #[serde(default = "default_sky_background")]
    pub sky_background: String,
}

/// Adaptive optics correction splitting the image into core and halo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveOptics {
    /// Fraction of flux in the diffraction-limited core
    pub strehl: f64,
    /// Core FWHM in arcsec
    pub core_fwhm_arcsec: f64,
}

/// Instrument optics in front of the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub name: String,
    /// Filter transmission resource
    #[serde(default)]
    pub filter: Option<String>,
    /// Throughput of the instrument optics
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub adaptive_optics: Option<AdaptiveOptics>,
}

/// What to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculationMethod {
    /// S/N reached by a set of imaging exposures
    ImagingS2n {
        exposure_time: f64,
        exposures: u32,
        frac_with_source: f64,
        #[serde(default = "one")]
        elfn: f64,
    },
    /// Integration time needed for a target imaging S/N
    ImagingIntegrationTime {
        target_s2n: f64,
        /// Duration of a single exposure, used to count exposures
        exposure_time: f64,
        frac_with_source: f64,
        #[serde(default = "one")]
        elfn: f64,
    },
    /// Per-pixel S/N of a long-slit spectrum
    SpectroscopyS2n {
        exposures: SpecExposures,
        slit_width_arcsec: f64,
        disperser: Disperser,
        /// Observed wavelength range on the detector, nm
        wavelength_range_nm: (f64, f64),
    },
}

/// Extraction aperture and sky subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub aperture: ApertureChoice,
    /// Sky aperture relative to the source aperture, or IFU sky fibres
    #[serde(default = "default_sky_aperture")]
    pub sky_aperture: f64,
}

/// A complete calculation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItcRequest {
    pub source: SourceConfig,
    pub conditions: ObservingConditions,
    pub telescope: TelescopeConfig,
    pub detector: DetectorConfig,
    pub instrument: InstrumentConfig,
    pub method: CalculationMethod,
    pub analysis: AnalysisConfig,
    /// Sampling of the working spectra in nm
    #[serde(default = "default_sampling")]
    pub sampling_nm: f64,
}

impl ItcRequest {
    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
