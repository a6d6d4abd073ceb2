//! Multiplicative transmission curves and additive emission.
//!
//! Atmosphere, telescope coating, filters and detector quantum efficiency
//! all act the same way: each sample is multiplied by the curve value at
//! its wavelength. Curves that don't cover a wavelength contribute zero
//! there.

use log::info;
use shared::algo::tabulated::TabulatedCurve;
use shared::resource::ResourceLibrary;
use std::sync::Arc;

use super::{PipelineError, SpectrumTransform};
use crate::photometry::SampledSpectrum;

/// Airmass category used to pick an atmospheric transmission file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirmassBucket {
    /// Airmass below 1.26
    Low,
    /// Airmass from 1.26 to 1.75
    Medium,
    /// Airmass above 1.75
    High,
}

impl AirmassBucket {
    pub fn from_airmass(airmass: f64) -> Self {
        if airmass < 1.26 {
            AirmassBucket::Low
        } else if airmass > 1.75 {
            AirmassBucket::High
        } else {
            AirmassBucket::Medium
        }
    }

    /// Resource name suffix: `10`, `15` or `20`.
    pub fn suffix(&self) -> &'static str {
        match self {
            AirmassBucket::Low => "10",
            AirmassBucket::Medium => "15",
            AirmassBucket::High => "20",
        }
    }

    /// Resource name for a base such as `atmosphere/skytrans`.
    pub fn resource_name(&self, base: &str) -> String {
        format!("{base}_{}.dat", self.suffix())
    }
}

/// Multiply by an interpolated transmission curve.
#[derive(Debug, Clone)]
pub struct Transmission {
    label: String,
    curve: Arc<TabulatedCurve>,
}

impl Transmission {
    pub fn new(label: impl Into<String>, curve: Arc<TabulatedCurve>) -> Self {
        Self {
            label: label.into(),
            curve,
        }
    }

    /// Transmission curve loaded from the resource library.
    pub fn from_library(library: &ResourceLibrary, name: &str) -> Result<Self, PipelineError> {
        Ok(Self::new(name, library.curve(name)?))
    }

    /// Atmospheric transmission for `airmass`, from `{base}_{10|15|20}.dat`.
    pub fn atmosphere(
        library: &ResourceLibrary,
        base: &str,
        airmass: f64,
    ) -> Result<Self, PipelineError> {
        let bucket = AirmassBucket::from_airmass(airmass);
        let name = bucket.resource_name(base);
        info!("Airmass {airmass:.2} uses atmospheric transmission {name}");
        Self::from_library(library, &name)
    }

    pub fn curve(&self) -> &TabulatedCurve {
        &self.curve
    }
}

impl SpectrumTransform for Transmission {
    fn name(&self) -> String {
        format!("transmission {}", self.label)
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        let curve = &self.curve;
        sed.map_in_place(|x, y| y * curve.value_at(x));
        Ok(())
    }
}

/// Add an interpolated emission curve, e.g. telescope thermal background.
#[derive(Debug, Clone)]
pub struct BackgroundEmission {
    label: String,
    curve: Arc<TabulatedCurve>,
}

impl BackgroundEmission {
    pub fn new(label: impl Into<String>, curve: Arc<TabulatedCurve>) -> Self {
        Self {
            label: label.into(),
            curve,
        }
    }

    pub fn from_library(library: &ResourceLibrary, name: &str) -> Result<Self, PipelineError> {
        Ok(Self::new(name, library.curve(name)?))
    }
}

impl SpectrumTransform for BackgroundEmission {
    fn name(&self) -> String {
        format!("background emission {}", self.label)
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        let curve = &self.curve;
        sed.map_in_place(|x, y| y + curve.value_at(x));
        Ok(())
    }
}
