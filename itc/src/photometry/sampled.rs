//! Uniformly sampled spectra.
//!
//! [`SampledSpectrum`] is the shared data model of the calculator: every
//! transformation unit, the normalization step and both signal-to-noise
//! engines operate on it. Sample `i` sits at wavelength
//! `start + i * sampling` and the samples are contiguous.
//!
//! # Interpolation
//!
//! [`SampledSpectrum::value_at`] interpolates linearly between the two
//! bracketing samples. Wavelengths outside `[start, end]` return `0.0`.
//! Wavelengths within a tiny tolerance of a knot return the stored sample
//! exactly, so `value_at(x(i)) == y(i)` holds despite rounding in
//! `start + i * sampling`.
//!
//! # Ownership
//!
//! Operations mutate the spectrum in place. When a spectrum is needed by two
//! independent branches (source and halo, signal and background) the caller
//! takes an explicit `clone()` first.

use crate::pipeline::{PipelineError, SpectrumTransform};
use shared::algo::tabulated::TabulatedCurve;
use thiserror::Error;

/// Relative tolerance (in units of one sample) for snapping onto a knot.
const KNOT_TOLERANCE: f64 = 1e-9;

/// Errors that can occur with sampled spectrum operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("Spectrum needs at least one sample")]
    Empty,
    #[error("Sampling interval must be positive and finite, got {0}")]
    InvalidSampling(f64),
    #[error("Scale factor must be positive and finite, got {0}")]
    InvalidScale(f64),
    #[error("Range [{start}, {end}] is outside spectrum domain [{min}, {max}]")]
    OutOfDomain {
        start: f64,
        end: f64,
        min: f64,
        max: f64,
    },
    #[error("Range start {start} is above range end {end}")]
    ReversedRange { start: f64, end: f64 },
}

fn check_sampling(sampling: f64) -> Result<(), SpectrumError> {
    if sampling > 0.0 && sampling.is_finite() {
        Ok(())
    } else {
        Err(SpectrumError::InvalidSampling(sampling))
    }
}

fn check_scale(factor: f64) -> Result<(), SpectrumError> {
    if factor > 0.0 && factor.is_finite() {
        Ok(())
    } else {
        Err(SpectrumError::InvalidScale(factor))
    }
}

/// Number of samples of step `step` from `start` up to and including `end`.
pub fn sample_count(start: f64, end: f64, step: f64) -> usize {
    if end <= start {
        return 1;
    }
    ((end - start) / step + KNOT_TOLERANCE).floor() as usize + 1
}

/// Uniform-interval sampled function of wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledSpectrum {
    start: f64,
    sampling: f64,
    y: Vec<f64>,
}

impl SampledSpectrum {
    /// Create a spectrum from samples, the wavelength of sample 0 and the step.
    pub fn new(y: Vec<f64>, start: f64, sampling: f64) -> Result<Self, SpectrumError> {
        if y.is_empty() {
            return Err(SpectrumError::Empty);
        }
        check_sampling(sampling)?;
        Ok(Self { start, sampling, y })
    }

    /// Constant spectrum covering `[start, end]`.
    pub fn constant(value: f64, start: f64, end: f64, sampling: f64) -> Result<Self, SpectrumError> {
        check_sampling(sampling)?;
        let n = sample_count(start, end, sampling);
        Self::new(vec![value; n], start, sampling)
    }

    /// Sample a non-uniform curve over its whole domain.
    pub fn from_curve(curve: &TabulatedCurve, sampling: f64) -> Result<Self, SpectrumError> {
        Self::from_curve_range(curve, curve.x_min(), curve.x_max(), sampling)
    }

    /// Sample a non-uniform curve over `[start, end]`, which it must cover.
    pub fn from_curve_range(
        curve: &TabulatedCurve,
        start: f64,
        end: f64,
        sampling: f64,
    ) -> Result<Self, SpectrumError> {
        check_sampling(sampling)?;
        if start > end {
            return Err(SpectrumError::ReversedRange { start, end });
        }
        if start < curve.x_min() || end > curve.x_max() {
            return Err(SpectrumError::OutOfDomain {
                start,
                end,
                min: curve.x_min(),
                max: curve.x_max(),
            });
        }

        let n = sample_count(start, end, sampling);
        let y = (0..n)
            .map(|i| curve.value_at(start + i as f64 * sampling))
            .collect();
        Self::new(y, start, sampling)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Always false; a spectrum holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn sampling(&self) -> f64 {
        self.sampling
    }

    /// Wavelength of the last sample.
    pub fn end(&self) -> f64 {
        self.x(self.y.len() - 1)
    }

    pub fn values(&self) -> &[f64] {
        &self.y
    }

    /// Wavelength of sample `i`.
    pub fn x(&self, i: usize) -> f64 {
        self.start + i as f64 * self.sampling
    }

    /// Stored value of sample `i`, or `0.0` past the end.
    pub fn y(&self, i: usize) -> f64 {
        self.y.get(i).copied().unwrap_or(0.0)
    }

    /// Overwrite sample `i`; indices past the end are ignored.
    pub fn set_y(&mut self, i: usize, value: f64) {
        if let Some(y) = self.y.get_mut(i) {
            *y = value;
        }
    }

    /// Whether `[start, end]` lies inside the sampled domain.
    pub fn covers(&self, start: f64, end: f64) -> bool {
        let tol = self.sampling * KNOT_TOLERANCE;
        start >= self.start - tol && end <= self.end() + tol
    }

    /// Index of the sample at or below `x`, clamped to the valid range.
    pub fn lower_index(&self, x: f64) -> usize {
        let t = (x - self.start) / self.sampling;
        let nearest = t.round();
        let idx = if (t - nearest).abs() < KNOT_TOLERANCE {
            nearest
        } else {
            t.floor()
        };
        (idx.max(0.0) as usize).min(self.y.len() - 1)
    }

    /// Linearly interpolated value at wavelength `x`; `0.0` outside the domain.
    pub fn value_at(&self, x: f64) -> f64 {
        let t = (x - self.start) / self.sampling;
        let last = (self.y.len() - 1) as f64;

        let nearest = t.round();
        if (t - nearest).abs() < KNOT_TOLERANCE && nearest >= 0.0 && nearest <= last {
            return self.y[nearest as usize];
        }
        if !(t >= 0.0 && t <= last) {
            return 0.0;
        }

        let low = t.floor() as usize;
        let frac = t - low as f64;
        self.y[low] + frac * (self.y[low + 1] - self.y[low])
    }

    /// Replace the whole sample array and grid.
    pub fn reset(&mut self, y: Vec<f64>, start: f64, sampling: f64) -> Result<(), SpectrumError> {
        *self = Self::new(y, start, sampling)?;
        Ok(())
    }

    /// Stretch the wavelength axis by `factor`, keeping every sample.
    ///
    /// The grid is relabelled (`start` and `sampling` both scale) so the
    /// stretched spectrum is exact, with no re-interpolation.
    pub fn rescale_x(&mut self, factor: f64) -> Result<(), SpectrumError> {
        check_scale(factor)?;
        self.start *= factor;
        self.sampling *= factor;
        Ok(())
    }

    /// Stretch the wavelength axis by `factor` but keep the sampling step.
    ///
    /// The sample count changes with the stretched range and values are
    /// re-interpolated from the original grid.
    pub fn rescale_x_fixed_sampling(&mut self, factor: f64) -> Result<(), SpectrumError> {
        check_scale(factor)?;
        let new_start = self.start * factor;
        let new_end = self.end() * factor;
        let n = sample_count(new_start, new_end, self.sampling);

        let y = (0..n)
            .map(|i| self.value_at((new_start + i as f64 * self.sampling) / factor))
            .collect();
        self.y = y;
        self.start = new_start;
        Ok(())
    }

    /// Multiply every sample by `factor`.
    pub fn rescale_y(&mut self, factor: f64) {
        if factor == 1.0 {
            return;
        }
        self.y.iter_mut().for_each(|y| *y *= factor);
    }

    /// Replace each sample with `f(wavelength, value)`.
    pub fn map_in_place<F: FnMut(f64, f64) -> f64>(&mut self, mut f: F) {
        let (start, sampling) = (self.start, self.sampling);
        for (i, y) in self.y.iter_mut().enumerate() {
            *y = f(start + i as f64 * sampling, *y);
        }
    }

    /// Multiply each sample by its wavelength.
    pub fn apply_wavelength_correction(&mut self) {
        self.map_in_place(|x, y| x * y);
    }

    /// Keep only the samples whose wavelengths fall inside `[start, end]`.
    pub fn trim(&mut self, start: f64, end: f64) -> Result<(), SpectrumError> {
        if start > end {
            return Err(SpectrumError::ReversedRange { start, end });
        }
        let last = (self.y.len() - 1) as f64;
        let first = ((start - self.start) / self.sampling - KNOT_TOLERANCE)
            .ceil()
            .max(0.0);
        let final_idx = ((end - self.start) / self.sampling + KNOT_TOLERANCE)
            .floor()
            .min(last);
        if first > final_idx {
            return Err(SpectrumError::OutOfDomain {
                start,
                end,
                min: self.start,
                max: self.end(),
            });
        }

        let (first, final_idx) = (first as usize, final_idx as usize);
        self.start = self.x(first);
        self.y = self.y[first..=final_idx].to_vec();
        Ok(())
    }

    /// Boxcar smoothing over `element` samples.
    ///
    /// Odd windows are centred on the sample. Even windows cover
    /// `[i - element/2 + 1, i + element/2]`. Windows are truncated at the
    /// spectrum edges. Each window is averaged with the trapezoid rule.
    pub fn smooth_y(&mut self, element: usize) {
        let n = self.y.len();
        if element <= 1 || n < 2 {
            return;
        }
        let half = element / 2;

        let smoothed = (0..n)
            .map(|i| {
                let low = if element % 2 == 1 {
                    i.saturating_sub(half)
                } else {
                    (i + 1).saturating_sub(half)
                };
                let high = (i + half).min(n - 1);
                self.index_average(low, high)
            })
            .collect();
        self.y = smoothed;
    }

    /// Sum of all samples.
    pub fn sum(&self) -> f64 {
        self.y.iter().sum()
    }

    fn index_integral(&self, low: usize, high: usize) -> f64 {
        if low >= high {
            return 0.0;
        }
        let interior: f64 = self.y[low + 1..high].iter().sum();
        (self.y[low] + self.y[high] + 2.0 * interior) * self.sampling / 2.0
    }

    fn index_average(&self, low: usize, high: usize) -> f64 {
        if low >= high {
            return self.y[low];
        }
        self.index_integral(low, high) / ((high - low) as f64 * self.sampling)
    }

    /// Trapezoidal integral over the whole spectrum.
    pub fn integral(&self) -> f64 {
        self.index_integral(0, self.y.len() - 1)
    }

    /// Mean value over the whole spectrum.
    pub fn average(&self) -> f64 {
        self.index_average(0, self.y.len() - 1)
    }

    /// Integral of the interpolated spectrum between two wavelengths.
    ///
    /// Partial intervals at either end are integrated as trapezoids against
    /// the interpolated edge values.
    pub fn integral_between(&self, x_start: f64, x_end: f64) -> Result<f64, SpectrumError> {
        if x_start > x_end {
            return Err(SpectrumError::ReversedRange {
                start: x_start,
                end: x_end,
            });
        }
        if !self.covers(x_start, x_end) {
            return Err(SpectrumError::OutOfDomain {
                start: x_start,
                end: x_end,
                min: self.start,
                max: self.end(),
            });
        }
        let x_start = x_start.max(self.start);
        let x_end = x_end.min(self.end());

        let low = self.lower_index(x_start);
        let high = self.lower_index(x_end);
        if low >= high {
            return Ok(0.5 * (x_end - x_start) * (self.value_at(x_start) + self.value_at(x_end)));
        }

        let first = 0.5 * (self.x(low + 1) - x_start) * (self.value_at(x_start) + self.y[low + 1]);
        let middle = self.index_integral(low + 1, high);
        let last = 0.5 * (x_end - self.x(high)) * (self.y[high] + self.value_at(x_end));
        Ok(first + middle + last)
    }

    /// Mean of the interpolated spectrum between two wavelengths.
    ///
    /// A zero-width range returns the interpolated value at that point.
    pub fn average_between(&self, x_start: f64, x_end: f64) -> Result<f64, SpectrumError> {
        let integral = self.integral_between(x_start, x_end)?;
        let width = x_end - x_start;
        if width <= 0.0 {
            return Ok(self.value_at(x_start));
        }
        Ok(integral / width)
    }

    /// Apply a transformation unit to this spectrum in place.
    pub fn accept<T: SpectrumTransform + ?Sized>(&mut self, unit: &T) -> Result<(), PipelineError> {
        unit.transform(self)
    }
}
