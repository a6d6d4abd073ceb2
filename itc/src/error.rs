use shared::resource::ResourceError;
use thiserror::Error;

use crate::calc::CalcError;
use crate::photometry::SpectrumError;
use crate::pipeline::PipelineError;

/// Any failure of a calculation request.
#[derive(Error, Debug)]
pub enum ItcError {
    #[error("Request error: {0}")]
    Request(#[from] std::io::Error),
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),
    #[error("Spectrum error: {0}")]
    Spectrum(#[from] SpectrumError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Calculation error: {0}")]
    Calc(#[from] CalcError),
}
