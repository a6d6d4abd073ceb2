//! Spectral transformation pipeline.
//!
//! Every physical effect applied to a spectrum between the source template
//! and the signal-to-noise engines is a [`SpectrumTransform`]: a unit with
//! parameters fixed at construction that mutates a [`SampledSpectrum`] in
//! place. Units own their parameters; nothing is shared between instances.
//!
//! Order matters and is chosen by the caller. A typical imaging chain is
//! redshift → normalize → dust → telescope aperture → atmosphere →
//! telescope transmission → instrument transmission, with resampling and
//! smoothing at the end for spectroscopy.
//!
//! # Example
//!
//! ```rust
//! use itc::photometry::SampledSpectrum;
//! use itc::pipeline::{DustScreen, Pipeline, Redshift};
//!
//! let mut sed = SampledSpectrum::constant(1.0, 400.0, 900.0, 1.0).unwrap();
//! let pipeline = Pipeline::new()
//!     .with(Redshift::new(0.5).unwrap())
//!     .with(DustScreen::new(1.0));
//! pipeline.apply(&mut sed).unwrap();
//!
//! assert!((sed.start() - 600.0).abs() < 1e-9);
//! assert!((sed.y(0) - 10f64.powf(-0.4)).abs() < 1e-12);
//! ```

pub mod extinction;
pub mod normalize;
pub mod redshift;
pub mod resample;
pub mod smooth;
pub mod telescope;
pub mod transmission;

pub use extinction::DustScreen;
pub use normalize::Normalize;
pub use redshift::Redshift;
pub use resample::Resample;
pub use smooth::{smoothing_element, Smoothing};
pub use telescope::TelescopeAperture;
pub use transmission::{AirmassBucket, BackgroundEmission, Transmission};

use log::debug;
use shared::resource::ResourceError;
use thiserror::Error;

use crate::photometry::{SampledSpectrum, SpectrumError};

/// Validation failures raised by transformation units.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Resample range [{start}, {end}] lies outside spectrum domain [{min}, {max}]")]
    ResampleOutOfBounds {
        start: f64,
        end: f64,
        min: f64,
        max: f64,
    },
    #[error("Redshift z = {0} is unphysical (must be above -0.9)")]
    UnphysicalRedshift(f64),
    #[error("Unrecognised brightness unit code {0:?}")]
    UnknownUnit(String),
    #[error(
        "Spectrum [{sed_start}, {sed_end}] does not cover normalization band [{band_start}, {band_end}]"
    )]
    BandNotCovered {
        band_start: f64,
        band_end: f64,
        sed_start: f64,
        sed_end: f64,
    },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// A transformation applied to a spectrum in place.
pub trait SpectrumTransform: Send + Sync {
    /// Short human-readable name used in logs.
    fn name(&self) -> String;

    /// Apply the transformation.
    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError>;
}

/// Ordered list of transformation units.
#[derive(Default)]
pub struct Pipeline {
    units: Vec<Box<dyn SpectrumTransform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit, builder style.
    pub fn with<T: SpectrumTransform + 'static>(mut self, unit: T) -> Self {
        self.units.push(Box::new(unit));
        self
    }

    /// Append a boxed unit.
    pub fn push(&mut self, unit: Box<dyn SpectrumTransform>) {
        self.units.push(unit);
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Apply every unit in order, stopping at the first failure.
    pub fn apply(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        for unit in &self.units {
            debug!("Applying {}", unit.name());
            sed.accept(unit.as_ref())?;
        }
        Ok(())
    }
}
