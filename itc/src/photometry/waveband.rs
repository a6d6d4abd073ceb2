//! Photometric wavebands used for flux normalization.
//!
//! A [`Waveband`] is a wavelength interval with a centre and the flux
//! density of a zero-magnitude (Vega) star. Zero points are stored in
//! Jansky and converted to photons s⁻¹ m⁻² nm⁻¹ with the same Jansky
//! conversion the brightness units use, so magnitudes and flux densities
//! stay consistent with each other.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::brightness::PhotonConversion;

/// Wavelength interval with a Vega zero point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waveband {
    /// Lower wavelength bound in nanometers
    pub start_nm: f64,
    /// Upper wavelength bound in nanometers
    pub end_nm: f64,
    /// Effective wavelength in nanometers
    pub center_nm: f64,
    /// Flux density of a zero-magnitude star, in Jansky
    pub vega_jansky: f64,
}

impl Waveband {
    /// Create a waveband from its bounds, centre and Vega flux density.
    ///
    /// # Panics
    /// Panics if the bounds are not finite and increasing, or the centre
    /// falls outside them.
    pub fn new(start_nm: f64, end_nm: f64, center_nm: f64, vega_jansky: f64) -> Self {
        if !(start_nm.is_finite() && end_nm.is_finite() && start_nm < end_nm) {
            panic!("Waveband bounds must be finite and increasing: [{start_nm}, {end_nm}]");
        }
        if !(center_nm >= start_nm && center_nm <= end_nm) {
            panic!("Waveband centre {center_nm} lies outside [{start_nm}, {end_nm}]");
        }
        Self {
            start_nm,
            end_nm,
            center_nm,
            vega_jansky,
        }
    }

    pub fn width(&self) -> f64 {
        self.end_nm - self.start_nm
    }

    /// Zero-magnitude photon flux density, photons s⁻¹ m⁻² nm⁻¹.
    pub fn zero_point(&self) -> f64 {
        self.vega_jansky * PhotonConversion::JANSKY / self.center_nm
    }
}

/// Standard Johnson/Cousins and infrared photometric bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardBand {
    U,
    B,
    V,
    R,
    I,
    J,
    H,
    K,
    L,
    M,
    N,
    Q,
}

impl StandardBand {
    pub const ALL: [StandardBand; 12] = [
        StandardBand::U,
        StandardBand::B,
        StandardBand::V,
        StandardBand::R,
        StandardBand::I,
        StandardBand::J,
        StandardBand::H,
        StandardBand::K,
        StandardBand::L,
        StandardBand::M,
        StandardBand::N,
        StandardBand::Q,
    ];

    pub fn waveband(&self) -> Waveband {
        let (start, end, center, jansky) = match self {
            StandardBand::U => (325.0, 395.0, 360.0, 1810.0),
            StandardBand::B => (390.0, 490.0, 440.0, 4260.0),
            StandardBand::V => (500.0, 600.0, 550.0, 3640.0),
            StandardBand::R => (575.0, 725.0, 650.0, 3080.0),
            StandardBand::I => (720.0, 880.0, 800.0, 2550.0),
            StandardBand::J => (1150.0, 1330.0, 1250.0, 1600.0),
            StandardBand::H => (1490.0, 1780.0, 1635.0, 1080.0),
            StandardBand::K => (2030.0, 2370.0, 2200.0, 670.0),
            StandardBand::L => (3500.0, 4100.0, 3800.0, 281.0),
            StandardBand::M => (4570.0, 4970.0, 4770.0, 154.0),
            StandardBand::N => (7970.0, 12970.0, 10470.0, 37.0),
            StandardBand::Q => (17570.0, 22570.0, 20070.0, 10.0),
        };
        Waveband::new(start, end, center, jansky)
    }
}

impl fmt::Display for StandardBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
