//! Detector characteristics consumed by the signal-to-noise engines.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

fn one() -> u32 {
    1
}

fn default_linearity_limit() -> f64 {
    0.8
}

/// Detector noise and geometry parameters.
///
/// Pixel size is on-sky (arcsec per unbinned pixel). Binning merges
/// `spatial_binning × spectral_binning` pixels into one read-out element,
/// so dark current adds up while read noise is paid once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Detector model name
    pub name: String,
    /// Unbinned pixel size in arcsec
    pub pixel_size_arcsec: f64,
    /// Dark current in electrons per pixel per second
    pub dark_current_e_p_s: f64,
    /// Read noise in electrons per read
    pub read_noise_e: f64,
    /// Full well depth in electrons
    pub well_depth_e: f64,
    /// Fraction of full well still considered linear
    #[serde(default = "default_linearity_limit")]
    pub linearity_limit: f64,
    #[serde(default = "one")]
    pub spatial_binning: u32,
    #[serde(default = "one")]
    pub spectral_binning: u32,
    /// Resource name of the quantum efficiency curve
    #[serde(default)]
    pub quantum_efficiency: Option<String>,
    /// Usable `[first, last]` pixel range for multi-chip spectroscopy
    #[serde(default)]
    pub ccd_pixel_range: Option<(usize, usize)>,
}

impl DetectorConfig {
    /// Create an unbinned detector without QE curve or pixel range.
    pub fn new(
        name: impl Into<String>,
        pixel_size_arcsec: f64,
        dark_current_e_p_s: f64,
        read_noise_e: f64,
        well_depth_e: f64,
    ) -> Self {
        Self {
            name: name.into(),
            pixel_size_arcsec,
            dark_current_e_p_s,
            read_noise_e,
            well_depth_e,
            linearity_limit: default_linearity_limit(),
            spatial_binning: 1,
            spectral_binning: 1,
            quantum_efficiency: None,
            ccd_pixel_range: None,
        }
    }

    pub fn with_binning(mut self, spatial: u32, spectral: u32) -> Self {
        self.spatial_binning = spatial.max(1);
        self.spectral_binning = spectral.max(1);
        self
    }

    pub fn with_quantum_efficiency(mut self, resource: impl Into<String>) -> Self {
        self.quantum_efficiency = Some(resource.into());
        self
    }

    /// Pixel size after spatial binning, arcsec
    pub fn binned_pixel_size(&self) -> f64 {
        self.pixel_size_arcsec * self.spatial_binning as f64
    }

    /// Dark current of one binned element, e⁻/s
    pub fn binned_dark_current(&self) -> f64 {
        self.dark_current_e_p_s * (self.spatial_binning * self.spectral_binning) as f64
    }

    /// Largest peak-pixel charge that is still acceptable, e⁻
    pub fn max_acceptable_flux(&self) -> f64 {
        self.well_depth_e * self.linearity_limit
    }
}

/// Standard detector models
pub mod models {
    use super::*;

    /// Optical CCD
    pub static OPTICAL_CCD: Lazy<DetectorConfig> = Lazy::new(|| {
        DetectorConfig::new("Optical CCD", 0.073, 0.001, 3.5, 105_000.0)
            .with_quantum_efficiency("detector/ccd_qe.dat")
    });

    /// Near-infrared HgCdTe array
    pub static NIR_HGCDTE: Lazy<DetectorConfig> = Lazy::new(|| {
        DetectorConfig::new("NIR HgCdTe", 0.117, 0.25, 12.0, 200_000.0)
            .with_quantum_efficiency("detector/hgcdte_qe.dat")
    });
}
