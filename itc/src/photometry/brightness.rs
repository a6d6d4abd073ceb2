//! Brightness units and their conversion to photon flux density.
//!
//! Source brightness arrives as a number plus a unit code. Normalization
//! needs it as a photon flux density in photons s⁻¹ m⁻² nm⁻¹ averaged over a
//! waveband. Magnitudes go through the band's zero point; the flux density
//! units use fixed conversion constants evaluated at the band centre.
//!
//! Each unit has a per-square-arcsecond (`_psa`) variant for extended
//! sources. The conversion is identical; the variants only tell the caller
//! that the result is a surface brightness.

use std::fmt;
use std::str::FromStr;

use super::waveband::Waveband;
use crate::pipeline::PipelineError;

/// Constants converting flux density units into photon flux density.
///
/// All results are photons s⁻¹ m⁻² nm⁻¹ when the wavelength is in nm.
pub struct PhotonConversion {}

impl PhotonConversion {
    /// Jansky → photons, divided by wavelength (nm)
    pub const JANSKY: f64 = 1.509e7;
    /// W m⁻² µm⁻¹ → photons, multiplied by wavelength (nm)
    pub const WATTS: f64 = 1.988e-13;
    /// erg s⁻¹ cm⁻² Å⁻¹ → photons, multiplied by wavelength (nm)
    pub const ERGS_WAVELENGTH: f64 = 1.988e-14;
    /// erg s⁻¹ cm⁻² Hz⁻¹ → photons, divided by wavelength (nm)
    pub const ERGS_FREQUENCY: f64 = 1.509e30;
    /// AB magnitude zero point, divided by wavelength (nm)
    pub const AB_ZERO_POINT: f64 = 5.632e10;
}

/// Unit in which a source brightness is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrightnessUnit {
    Mag,
    AbMag,
    Jansky,
    Watts,
    ErgsWavelength,
    ErgsFrequency,
    MagPsa,
    AbMagPsa,
    JanskyPsa,
    WattsPsa,
    ErgsWavelengthPsa,
    ErgsFrequencyPsa,
}

impl BrightnessUnit {
    pub const ALL: [BrightnessUnit; 12] = [
        BrightnessUnit::Mag,
        BrightnessUnit::AbMag,
        BrightnessUnit::Jansky,
        BrightnessUnit::Watts,
        BrightnessUnit::ErgsWavelength,
        BrightnessUnit::ErgsFrequency,
        BrightnessUnit::MagPsa,
        BrightnessUnit::AbMagPsa,
        BrightnessUnit::JanskyPsa,
        BrightnessUnit::WattsPsa,
        BrightnessUnit::ErgsWavelengthPsa,
        BrightnessUnit::ErgsFrequencyPsa,
    ];

    /// Code used in requests, e.g. `"mag"` or `"jy_psa"`.
    pub fn code(&self) -> &'static str {
        match self {
            BrightnessUnit::Mag => "mag",
            BrightnessUnit::AbMag => "abmag",
            BrightnessUnit::Jansky => "jy",
            BrightnessUnit::Watts => "watts",
            BrightnessUnit::ErgsWavelength => "ergs_wavelength",
            BrightnessUnit::ErgsFrequency => "ergs_frequency",
            BrightnessUnit::MagPsa => "mag_psa",
            BrightnessUnit::AbMagPsa => "abmag_psa",
            BrightnessUnit::JanskyPsa => "jy_psa",
            BrightnessUnit::WattsPsa => "watts_psa",
            BrightnessUnit::ErgsWavelengthPsa => "ergs_wavelength_psa",
            BrightnessUnit::ErgsFrequencyPsa => "ergs_frequency_psa",
        }
    }

    /// True for the per-square-arcsecond variants.
    pub fn is_surface_brightness(&self) -> bool {
        self.code().ends_with("_psa")
    }

    /// Photon flux density (photons s⁻¹ m⁻² nm⁻¹) for `value` in this unit.
    pub fn photon_flux(&self, value: f64, band: &Waveband) -> f64 {
        let center = band.center_nm;
        match self {
            BrightnessUnit::Mag | BrightnessUnit::MagPsa => {
                band.zero_point() * 10f64.powf(-0.4 * value)
            }
            BrightnessUnit::AbMag | BrightnessUnit::AbMagPsa => {
                PhotonConversion::AB_ZERO_POINT * 10f64.powf(-0.4 * value) / center
            }
            BrightnessUnit::Jansky | BrightnessUnit::JanskyPsa => {
                value * PhotonConversion::JANSKY / center
            }
            BrightnessUnit::Watts | BrightnessUnit::WattsPsa => {
                value * center / PhotonConversion::WATTS
            }
            BrightnessUnit::ErgsWavelength | BrightnessUnit::ErgsWavelengthPsa => {
                value * center / PhotonConversion::ERGS_WAVELENGTH
            }
            BrightnessUnit::ErgsFrequency | BrightnessUnit::ErgsFrequencyPsa => {
                value * PhotonConversion::ERGS_FREQUENCY / center
            }
        }
    }
}

impl FromStr for BrightnessUnit {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        BrightnessUnit::ALL
            .into_iter()
            .find(|unit| unit.code() == code)
            .ok_or_else(|| PipelineError::UnknownUnit(s.to_string()))
    }
}

impl fmt::Display for BrightnessUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::waveband::StandardBand;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_codes() {
        for unit in BrightnessUnit::ALL {
            assert_eq!(unit.code().parse::<BrightnessUnit>().unwrap(), unit);
        }
        assert_eq!("  JY ".parse::<BrightnessUnit>().unwrap(), BrightnessUnit::Jansky);
    }

    #[test]
    fn test_unknown_code() {
        let err = "furlongs".parse::<BrightnessUnit>().unwrap_err();
        assert!(matches!(err, PipelineError::UnknownUnit(ref c) if c == "furlongs"));
    }

    #[test]
    fn test_zero_magnitude_is_zero_point() {
        let band = StandardBand::V.waveband();
        assert_relative_eq!(
            BrightnessUnit::Mag.photon_flux(0.0, &band),
            band.zero_point()
        );
        assert_relative_eq!(
            BrightnessUnit::Mag.photon_flux(5.0, &band),
            band.zero_point() / 100.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_vega_jansky_matches_zero_magnitude() {
        let band = StandardBand::K.waveband();
        assert_relative_eq!(
            BrightnessUnit::Jansky.photon_flux(band.vega_jansky, &band),
            BrightnessUnit::Mag.photon_flux(0.0, &band),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_flux_density_formulas() {
        let band = StandardBand::V.waveband();
        assert_relative_eq!(
            BrightnessUnit::Watts.photon_flux(1e-12, &band),
            1e-12 * 550.0 / 1.988e-13,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            BrightnessUnit::ErgsWavelength.photon_flux(1e-15, &band),
            1e-15 * 550.0 / 1.988e-14,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            BrightnessUnit::ErgsFrequency.photon_flux(1e-26, &band),
            1e-26 * 1.509e30 / 550.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            BrightnessUnit::AbMag.photon_flux(0.0, &band),
            5.632e10 / 550.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_psa_variants_share_formulas() {
        let band = StandardBand::J.waveband();
        assert!(BrightnessUnit::WattsPsa.is_surface_brightness());
        assert!(!BrightnessUnit::Watts.is_surface_brightness());
        assert_eq!(
            BrightnessUnit::JanskyPsa.photon_flux(2.0, &band),
            BrightnessUnit::Jansky.photon_flux(2.0, &band)
        );
    }
}
