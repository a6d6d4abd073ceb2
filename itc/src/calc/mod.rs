//! Aperture geometry and signal-to-noise calculations.
//!
//! Everything here consumes spectra that have already been through the
//! [`crate::pipeline`] and turns them into fractions, pixel counts, noise
//! budgets and exposure times.

pub mod exposures;
pub mod image_quality;
pub mod imaging;
pub mod peak_pixel;
pub mod slit_throughput;
pub mod source_fraction;
pub mod spectroscopy;

pub use exposures::{check_source_fraction, SOURCE_FRACTION_TOLERANCE};
pub use image_quality::ImageQuality;
pub use imaging::{ExposureTimeSolver, HaloTerm, ImagingS2N, NoiseBudget};
pub use peak_pixel::{PeakPixelFlux, PixelRates};
pub use slit_throughput::{SlitFraction, SlitThroughput, UniformSlitThroughput};
pub use source_fraction::{
    source_fraction_calculator, ApertureChoice, PointSourceFraction, SourceFraction,
    SourceFractionCalculator, SourceGeometry, UniformSourceFraction,
};
pub use spectroscopy::{
    Disperser, HaloComponent, Slit, SpecExposures, SpecS2N, SpecS2NResult, SpecSetup,
};

use shared::algo::grid2d::GridError;
use shared::resource::ResourceError;
use thiserror::Error;

use crate::photometry::SpectrumError;
use crate::pipeline::PipelineError;

/// Ratio between a Gaussian's FWHM and its standard deviation.
pub const FWHM_TO_SIGMA: f64 = 2.355;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error(
        "{exposures} exposures with source fraction {fraction} give {product} on-source \
         exposures; choose values whose product is an integer"
    )]
    NonIntegralExposures {
        exposures: u32,
        fraction: f64,
        product: f64,
    },
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
