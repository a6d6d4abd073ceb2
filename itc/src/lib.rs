//! Integration time calculator
//!
//! Predicts the signal-to-noise ratio an instrument reaches on a source,
//! or the exposure time needed for a target S/N. A source spectrum is
//! pushed through an ordered chain of spectral transformations
//! (redshift, normalization, extinction, atmosphere, telescope and
//! instrument throughput), then combined with aperture or slit geometry
//! and the detector's noise characteristics.

pub mod calc;
pub mod config;
pub mod error;
pub mod hardware;
pub mod photometry;
pub mod pipeline;
pub mod recipe;

// Re-exports for easier access
pub use calc::{ImagingS2N, SpecS2N};
pub use config::ItcRequest;
pub use error::ItcError;
pub use hardware::{DetectorConfig, TelescopeConfig};
pub use photometry::SampledSpectrum;
pub use pipeline::{Pipeline, SpectrumTransform};
pub use recipe::{run, ItcResult};
