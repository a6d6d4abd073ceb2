//! Spectra, wavebands and brightness units

pub mod brightness;
pub mod sampled;
pub mod sed;
pub mod waveband;

pub use brightness::{BrightnessUnit, PhotonConversion};
pub use sampled::{sample_count, SampledSpectrum, SpectrumError};
pub use sed::SedTemplate;
pub use waveband::{StandardBand, Waveband};
