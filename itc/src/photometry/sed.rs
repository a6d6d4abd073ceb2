//! Source spectral energy distribution templates.
//!
//! A template produces the base [`SampledSpectrum`] at the start of a
//! calculation. Its absolute scale is irrelevant: normalization rescales
//! it to the requested brightness afterwards.

use log::debug;
use serde::{Deserialize, Serialize};
use shared::algo::tabulated::TabulatedCurve;
use shared::resource::ResourceLibrary;

use super::sampled::SampledSpectrum;
use crate::pipeline::PipelineError;

/// Observed-frame wavelength range covered by generated templates, in nm.
pub const GENERATED_RANGE_NM: (f64, f64) = (300.0, 30000.0);

/// hc/k in µm·K, used by the Planck function.
const HC_OVER_K_UM_K: f64 = 14387.0;

/// Shape of the source spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SedTemplate {
    /// Two-column template loaded from the resource library
    Library { resource: String },
    /// Template rows supplied inline with the request
    UserDefined { rows: Vec<(f64, f64)> },
    /// Blackbody at the given temperature
    BlackBody { temperature_k: f64 },
}

/// Photon flux density of a blackbody at `wavelength_nm`, arbitrary scale.
///
/// Planck's law divided by the photon energy, which goes as
/// `λ⁻⁴ / (exp(hc/λkT) - 1)`.
pub fn blackbody_photon_flux(wavelength_nm: f64, temperature_k: f64) -> f64 {
    let lambda_um = wavelength_nm / 1000.0;
    1.0 / lambda_um.powi(4) / ((HC_OVER_K_UM_K / (lambda_um * temperature_k)).exp() - 1.0)
}

impl SedTemplate {
    /// Build the rest-frame spectrum sampled every `sampling` nm.
    ///
    /// Generated templates are laid out so that after a shift to redshift
    /// `z` they cover [`GENERATED_RANGE_NM`] in the observed frame.
    pub fn build(
        &self,
        library: &ResourceLibrary,
        sampling: f64,
        z: f64,
    ) -> Result<SampledSpectrum, PipelineError> {
        let sed = match self {
            SedTemplate::Library { resource } => {
                let curve = library.curve(resource)?;
                SampledSpectrum::from_curve(&curve, sampling)?
            }
            SedTemplate::UserDefined { rows } => {
                let curve = TabulatedCurve::from_rows(rows).map_err(|e| {
                    PipelineError::InvalidParameter(format!("user-defined SED: {e}"))
                })?;
                SampledSpectrum::from_curve(&curve, sampling)?
            }
            SedTemplate::BlackBody { temperature_k } => {
                if !(*temperature_k > 0.0) {
                    return Err(PipelineError::InvalidParameter(format!(
                        "blackbody temperature must be positive, got {temperature_k}"
                    )));
                }
                let start = GENERATED_RANGE_NM.0 / (1.0 + z);
                let end = GENERATED_RANGE_NM.1 / (1.0 + z);
                let mut sed = SampledSpectrum::constant(0.0, start, end, sampling)?;
                sed.map_in_place(|x, _| blackbody_photon_flux(x, *temperature_k));
                sed
            }
        };

        debug!(
            "Built SED {:?}: {} samples over [{:.1}, {:.1}] nm",
            self.label(),
            sed.len(),
            sed.start(),
            sed.end()
        );
        Ok(sed)
    }

    fn label(&self) -> String {
        match self {
            SedTemplate::Library { resource } => resource.clone(),
            SedTemplate::UserDefined { rows } => format!("user ({} rows)", rows.len()),
            SedTemplate::BlackBody { temperature_k } => format!("blackbody {temperature_k} K"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_blackbody_peak_follows_wien() {
        // Photon-count peak sits near 3670 µm·K / T
        let sed = SedTemplate::BlackBody {
            temperature_k: 5000.0,
        }
        .build(&ResourceLibrary::new("/nonexistent"), 1.0, 0.0)
        .unwrap();

        let (peak, _) = sed
            .values()
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        let peak_nm = sed.x(peak);
        assert!((peak_nm - 734.0).abs() < 5.0, "peak at {peak_nm}");
    }

    #[test]
    fn test_blackbody_redshift_layout() {
        let sed = SedTemplate::BlackBody {
            temperature_k: 8000.0,
        }
        .build(&ResourceLibrary::new("/nonexistent"), 10.0, 1.0)
        .unwrap();
        assert_relative_eq!(sed.start(), 150.0);
        assert!(sed.end() <= 15000.0 + 1e-9);
    }

    #[test]
    fn test_blackbody_rejects_bad_temperature() {
        let result = SedTemplate::BlackBody { temperature_k: 0.0 }.build(
            &ResourceLibrary::new("/nonexistent"),
            1.0,
            0.0,
        );
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));
    }

    #[test]
    fn test_user_defined_rows() {
        let template = SedTemplate::UserDefined {
            rows: vec![(400.0, 1.0), (500.0, 2.0), (600.0, 3.0)],
        };
        let sed = template
            .build(&ResourceLibrary::new("/nonexistent"), 50.0, 0.0)
            .unwrap();
        assert_eq!(sed.len(), 5);
        assert_relative_eq!(sed.y(1), 1.5, epsilon = 1e-12);

        let bad = SedTemplate::UserDefined {
            rows: vec![(400.0, 1.0)],
        };
        assert!(bad
            .build(&ResourceLibrary::new("/nonexistent"), 50.0, 0.0)
            .is_err());
    }

    #[test]
    fn test_library_template() {
        let library = ResourceLibrary::new("/nonexistent");
        library.insert_curve(
            "sed/test.dat",
            TabulatedCurve::new(vec![100.0, 200.0], vec![2.0, 2.0]).unwrap(),
        );
        let sed = SedTemplate::Library {
            resource: "sed/test.dat".to_string(),
        }
        .build(&library, 10.0, 0.0)
        .unwrap();
        assert_eq!(sed.len(), 11);
        assert!(sed.values().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_serde_tagging() {
        let json = r#"{"kind":"black_body","temperature_k":6000.0}"#;
        let template: SedTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(
            template,
            SedTemplate::BlackBody {
                temperature_k: 6000.0
            }
        );
    }
}
