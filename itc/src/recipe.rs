//! End-to-end calculation in the canonical order.
//!
//! The source spectrum goes through SED → redshift → normalization → dust
//! → telescope collecting area → atmosphere → telescope coating →
//! instrument optics, filter and detector QE. The sky goes through the
//! coating, picks up the telescope's thermal emission and then follows the
//! same instrument chain. The result feeds the imaging engine, the
//! exposure-time solver or the spectroscopic engine depending on the
//! requested method.

use log::info;
use serde::Serialize;
use shared::algo::tabulated::TabulatedCurve;
use shared::resource::ResourceLibrary;

use crate::calc::imaging::NoiseBudget;
use crate::calc::{
    check_source_fraction, source_fraction_calculator, ApertureChoice, CalcError,
    ExposureTimeSolver, HaloComponent, ImagingS2N, PeakPixelFlux, PixelRates, SlitFraction,
    SlitThroughput, SourceFraction, SourceGeometry, SpecS2N, SpecSetup, UniformSlitThroughput,
};
use crate::config::{CalculationMethod, ItcRequest};
use crate::error::ItcError;
use crate::photometry::SampledSpectrum;
use crate::pipeline::{
    BackgroundEmission, DustScreen, Normalize, Pipeline, Redshift, TelescopeAperture, Transmission,
};

/// Serializable copy of a sampled spectrum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumData {
    pub start_nm: f64,
    pub sampling_nm: f64,
    pub values: Vec<f64>,
}

impl From<&SampledSpectrum> for SpectrumData {
    fn from(spectrum: &SampledSpectrum) -> Self {
        Self {
            start_nm: spectrum.start(),
            sampling_nm: spectrum.sampling(),
            values: spectrum.values().to_vec(),
        }
    }
}

/// Method-specific part of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    ImagingS2n {
        budget: NoiseBudget,
        single_s2n: f64,
        total_s2n: f64,
    },
    ImagingIntegrationTime {
        /// Total on-source integration time, s
        integration_time: f64,
        /// Exposures needed, counting those without the source
        exposures: u32,
        /// Budget of a single exposure
        budget: NoiseBudget,
    },
    Spectroscopy {
        spatial_pixels: f64,
        slit_throughput: f64,
        signal: SpectrumData,
        sqrt_background: SpectrumData,
        exp_s2n: SpectrumData,
        final_s2n: SpectrumData,
        peak_final_s2n: f64,
    },
}

/// Result of one calculation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItcResult {
    /// Delivered FWHM of the source image, arcsec
    pub image_quality_arcsec: f64,
    /// Imaging aperture, absent for spectroscopy
    pub aperture: Option<SourceFraction>,
    /// Peak pixel electrons of one imaging exposure
    pub peak_pixel_flux: Option<f64>,
    pub advisories: Vec<String>,
    pub outcome: Outcome,
}

/// Source and sky after every transformation, ready for the engines.
struct Spectra {
    source: SampledSpectrum,
    sky: SampledSpectrum,
}

/// Image core and optional AO halo split.
struct ImageSplit {
    core_share: f64,
    core_iq: f64,
    halo_iq: Option<f64>,
}

impl ImageSplit {
    fn new(request: &ItcRequest, seeing_iq: f64) -> Result<Self, CalcError> {
        match request.instrument.adaptive_optics {
            None => Ok(Self {
                core_share: 1.0,
                core_iq: seeing_iq,
                halo_iq: None,
            }),
            Some(ao) => {
                if !(ao.strehl > 0.0 && ao.strehl <= 1.0) {
                    return Err(CalcError::InvalidObservation(format!(
                        "Strehl ratio must be in (0, 1], got {}",
                        ao.strehl
                    )));
                }
                Ok(Self {
                    core_share: ao.strehl,
                    core_iq: ao.core_fwhm_arcsec,
                    halo_iq: Some(seeing_iq),
                })
            }
        }
    }
}

fn instrument_chain(
    request: &ItcRequest,
    library: &ResourceLibrary,
) -> Result<Vec<Transmission>, ItcError> {
    let names = [
        request.instrument.transmission.as_deref(),
        request.instrument.filter.as_deref(),
        request.detector.quantum_efficiency.as_deref(),
    ];
    let mut chain = Vec::new();
    for name in names.into_iter().flatten() {
        chain.push(Transmission::from_library(library, name)?);
    }
    Ok(chain)
}

fn build_spectra(request: &ItcRequest, library: &ResourceLibrary) -> Result<Spectra, ItcError> {
    let source_cfg = &request.source;
    let telescope = &request.telescope;
    let coating = Transmission::from_library(library, &telescope.coating)?;
    let aperture = TelescopeAperture::new(telescope);
    let instrument = instrument_chain(request, library)?;

    let mut source_pipeline = Pipeline::new()
        .with(Redshift::new(source_cfg.redshift)?)
        .with(Normalize::from_code(
            source_cfg.band.waveband(),
            source_cfg.brightness,
            &source_cfg.unit,
        )?)
        .with(DustScreen::new(source_cfg.extinction_av))
        .with(aperture)
        .with(Transmission::atmosphere(
            library,
            &request.conditions.atmosphere,
            request.conditions.airmass,
        )?)
        .with(coating.clone());

    let mut sky_pipeline = Pipeline::new().with(coating);
    if let Some(thermal) = telescope.thermal_background.as_deref() {
        sky_pipeline = sky_pipeline.with(BackgroundEmission::from_library(library, thermal)?);
    }
    sky_pipeline = sky_pipeline.with(aperture);

    for unit in instrument {
        source_pipeline.push(Box::new(unit.clone()));
        sky_pipeline.push(Box::new(unit));
    }

    let mut source = source_cfg
        .sed
        .build(library, request.sampling_nm, source_cfg.redshift)?;
    source_pipeline.apply(&mut source)?;

    let sky_curve = library.curve(&request.conditions.sky_background)?;
    let mut sky = SampledSpectrum::from_curve(&sky_curve, request.sampling_nm)?;
    sky_pipeline.apply(&mut sky)?;

    Ok(Spectra { source, sky })
}

/// Transmission-weighted mean wavelength of a filter curve.
fn effective_wavelength(curve: &TabulatedCurve) -> Option<f64> {
    let (mut weighted, mut total) = (0.0, 0.0);
    for w in curve.xs().windows(2).zip(curve.ys().windows(2)) {
        let ((x0, x1), (y0, y1)) = ((w.0[0], w.0[1]), (w.1[0], w.1[1]));
        let dx = x1 - x0;
        total += 0.5 * (y0 + y1) * dx;
        weighted += 0.5 * (x0 * y0 + x1 * y1) * dx;
    }
    (total > 0.0).then(|| weighted / total)
}

enum ImagingGoal {
    S2n { exposures: u32, frac_with_source: f64 },
    Time { target_s2n: f64, frac_with_source: f64 },
}

/// Smallest exposure count giving at least `on_source` frames with the
/// source and an integral number of them.
fn exposures_for(on_source: f64, frac_with_source: f64) -> Result<u32, CalcError> {
    let first = (on_source.ceil().max(1.0) / frac_with_source).ceil();
    if !(frac_with_source > 0.0 && frac_with_source <= 1.0) || !first.is_finite() {
        return Err(CalcError::InvalidObservation(format!(
            "fraction of exposures with the source must be in (0, 1], got {frac_with_source}"
        )));
    }
    let first = first as u32;
    (first..first.saturating_add(100))
        .find(|&n| check_source_fraction(n, frac_with_source).is_ok())
        .ok_or(CalcError::NonIntegralExposures {
            exposures: first,
            fraction: frac_with_source,
            product: first as f64 * frac_with_source,
        })
}

fn check_conditions(request: &ItcRequest) -> Result<(), CalcError> {
    let airmass = request.conditions.airmass;
    if !(airmass >= 1.0) {
        return Err(CalcError::InvalidObservation(format!(
            "airmass must be at least 1, got {airmass}"
        )));
    }
    Ok(())
}

/// Run a calculation request against a resource library.
pub fn run(request: &ItcRequest, library: &ResourceLibrary) -> Result<ItcResult, ItcError> {
    check_conditions(request)?;
    let spectra = build_spectra(request, library)?;
    match &request.method {
        CalculationMethod::SpectroscopyS2n { .. } => spectroscopy(request, library, spectra),
        _ => imaging(request, library, spectra),
    }
}

fn imaging(
    request: &ItcRequest,
    library: &ResourceLibrary,
    spectra: Spectra,
) -> Result<ItcResult, ItcError> {
    let detector = &request.detector;
    let geometry = request.source.geometry;
    let pixel_size = detector.binned_pixel_size();

    let filter_curve = match request.instrument.filter.as_deref() {
        Some(filter) => Some(library.curve(filter)?),
        None => None,
    };
    let wavelength = filter_curve
        .as_deref()
        .and_then(effective_wavelength)
        .unwrap_or(request.source.band.waveband().center_nm);
    let seeing_iq = request
        .conditions
        .image_quality
        .fwhm(request.conditions.airmass, wavelength);
    let split = ImageSplit::new(request, seeing_iq)?;
    info!(
        "Imaging at {wavelength:.1} nm, image quality {:.3} arcsec",
        split.core_iq
    );

    let aperture =
        source_fraction_calculator(geometry, request.analysis.aperture, pixel_size, split.core_iq)
            .calculate()?;
    let sed_integral = spectra.source.integral();
    let sky_integral = spectra.sky.integral();

    let (exposure_time, elfn, goal) = match request.method {
        CalculationMethod::ImagingS2n {
            exposure_time,
            exposures,
            frac_with_source,
            elfn,
        } => (
            exposure_time,
            elfn,
            ImagingGoal::S2n {
                exposures,
                frac_with_source,
            },
        ),
        CalculationMethod::ImagingIntegrationTime {
            target_s2n,
            exposure_time,
            frac_with_source,
            elfn,
        } => (
            exposure_time,
            elfn,
            ImagingGoal::Time {
                target_s2n,
                frac_with_source,
            },
        ),
        CalculationMethod::SpectroscopyS2n { .. } => {
            return Err(CalcError::InvalidObservation("not an imaging method".into()).into())
        }
    };
    if !(exposure_time > 0.0) {
        return Err(CalcError::InvalidObservation(format!(
            "exposure time must be positive, got {exposure_time}"
        ))
        .into());
    }

    let mut s2n = ImagingS2N::new(
        sed_integral * split.core_share,
        sky_integral,
        aperture,
        detector,
    )
    .with_elfn(elfn);
    if let Some(halo_iq) = split.halo_iq {
        let halo_aperture = ApertureChoice::User {
            diameter_arcsec: aperture.aperture_diameter,
        };
        let halo = source_fraction_calculator(geometry, halo_aperture, pixel_size, halo_iq)
            .calculate()?;
        s2n = s2n.with_halo(sed_integral * (1.0 - split.core_share), halo.source_fraction);
    }

    let rates = PixelRates {
        source: sed_integral,
        background: sky_integral,
        dark_current: detector.binned_dark_current(),
    };
    let peak = if geometry.is_uniform() {
        PeakPixelFlux::uniform_source(
            pixel_size,
            exposure_time,
            &rates,
            aperture.source_fraction,
            aperture.enclosed_pixels,
        )
    } else {
        PeakPixelFlux::from_library(library)?.point_source(
            geometry.effective_image_quality(split.core_iq),
            pixel_size,
            exposure_time,
            &rates,
        )
    };

    let budget = s2n.noise_budget(exposure_time);
    let mut advisories = vec![budget.background_advisory()];
    advisories.extend(ImagingS2N::saturation_advisory(peak, detector));

    let outcome = match goal {
        ImagingGoal::S2n {
            exposures,
            frac_with_source,
        } => {
            let total_s2n =
                s2n.total_s2n(&budget, exposures, frac_with_source, request.analysis.sky_aperture)?;
            info!("Imaging S/N {:.2} per exposure, {total_s2n:.2} total", budget.s2n());
            Outcome::ImagingS2n {
                budget,
                single_s2n: budget.s2n(),
                total_s2n,
            }
        }
        ImagingGoal::Time {
            target_s2n,
            frac_with_source,
        } => {
            let integration_time = ExposureTimeSolver::new(&s2n).solve(target_s2n);
            let exposures =
                exposures_for(integration_time / exposure_time, frac_with_source)?;
            info!("S/N {target_s2n} needs {integration_time:.1} s in {exposures} exposures");
            Outcome::ImagingIntegrationTime {
                integration_time,
                exposures,
                budget,
            }
        }
    };

    Ok(ItcResult {
        image_quality_arcsec: split.core_iq,
        aperture: Some(aperture),
        peak_pixel_flux: Some(peak),
        advisories,
        outcome,
    })
}

fn slit_fraction(
    library: &ResourceLibrary,
    geometry: SourceGeometry,
    aperture: ApertureChoice,
    image_quality: f64,
    pixel_size: f64,
    slit_width: f64,
) -> Result<Box<dyn SlitFraction>, ItcError> {
    if geometry.is_uniform() {
        return Ok(Box::new(UniformSlitThroughput::new(
            aperture, pixel_size, slit_width,
        )));
    }
    Ok(Box::new(SlitThroughput::from_library(
        library,
        aperture,
        geometry.effective_image_quality(image_quality),
        pixel_size,
        slit_width,
    )?))
}

fn spectroscopy(
    request: &ItcRequest,
    library: &ResourceLibrary,
    spectra: Spectra,
) -> Result<ItcResult, ItcError> {
    let CalculationMethod::SpectroscopyS2n {
        exposures,
        slit_width_arcsec,
        disperser,
        wavelength_range_nm,
    } = &request.method
    else {
        return Err(CalcError::InvalidObservation("not a spectroscopic method".into()).into());
    };

    let detector = &request.detector;
    let geometry = request.source.geometry;
    let pixel_size = detector.binned_pixel_size();
    let (start, end) = *wavelength_range_nm;

    let seeing_iq = request
        .conditions
        .image_quality
        .fwhm(request.conditions.airmass, 0.5 * (start + end));
    let split = ImageSplit::new(request, seeing_iq)?;
    info!(
        "Spectroscopy over [{start}, {end}] nm, image quality {:.3} arcsec",
        split.core_iq
    );

    let aperture = request.analysis.aperture;
    let throughput = slit_fraction(
        library,
        geometry,
        aperture,
        split.core_iq,
        pixel_size,
        *slit_width_arcsec,
    )?;
    let spatial_pixels = throughput.spatial_pixels();
    let slit_throughput = throughput.throughput();

    let Spectra { source, sky } = spectra;
    let mut core = source.clone();
    core.rescale_y(split.core_share);

    let setup = SpecSetup {
        disperser: disperser.clone(),
        slit_width: *slit_width_arcsec,
        wavelength_range: (start, end),
        image_quality: split.core_iq,
        exposures: *exposures,
        sky_aperture: request.analysis.sky_aperture,
    };
    let mut engine = SpecS2N::new(core, sky, throughput, setup, detector);
    if let Some(halo_iq) = split.halo_iq {
        let mut flux = source;
        flux.rescale_y(1.0 - split.core_share);
        engine = engine.with_halo(HaloComponent {
            flux,
            throughput: slit_fraction(
                library,
                geometry,
                aperture,
                halo_iq,
                pixel_size,
                *slit_width_arcsec,
            )?,
            image_quality: halo_iq,
        });
    }
    let result = engine.run()?;

    let peak_final_s2n = result
        .final_s2n
        .values()
        .iter()
        .copied()
        .fold(0.0, f64::max);
    info!("Peak final S/N {peak_final_s2n:.2}");

    Ok(ItcResult {
        image_quality_arcsec: split.core_iq,
        aperture: None,
        peak_pixel_flux: None,
        advisories: Vec::new(),
        outcome: Outcome::Spectroscopy {
            spatial_pixels,
            slit_throughput,
            signal: (&result.signal).into(),
            sqrt_background: (&result.sqrt_background).into(),
            exp_s2n: (&result.exp_s2n).into(),
            final_s2n: (&result.final_s2n).into(),
            peak_final_s2n,
        },
    })
}
