//! Resampling onto a new uniform wavelength grid.
//!
//! Each new sample is the mean of the old spectrum over a window one new
//! step wide, centred on the new wavelength. The window is clipped to the
//! old domain. When the new grid coincides with the old one (same step,
//! start on an old knot) the samples are copied directly.

use super::{PipelineError, SpectrumTransform};
use crate::photometry::{sample_count, SampledSpectrum};

/// Fraction of a step within which two grids are considered aligned.
const GRID_TOLERANCE: f64 = 1e-9;

/// Resample to `[start, end]` with step `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resample {
    start: f64,
    end: f64,
    step: f64,
    padding: Option<f64>,
}

impl Resample {
    /// Strict resampling: the new range must lie inside the old domain.
    pub fn strict(start: f64, end: f64, step: f64) -> Self {
        Self {
            start,
            end,
            step,
            padding: None,
        }
    }

    /// Resampling that fills wavelengths outside the old domain with `pad`.
    pub fn with_padding(start: f64, end: f64, step: f64, pad: f64) -> Self {
        Self {
            start,
            end,
            step,
            padding: Some(pad),
        }
    }

    fn aligned_offset(&self, sed: &SampledSpectrum, n: usize) -> Option<usize> {
        if (self.step - sed.sampling()).abs() > GRID_TOLERANCE * sed.sampling() {
            return None;
        }
        let offset = (self.start - sed.start()) / sed.sampling();
        let nearest = offset.round();
        if (offset - nearest).abs() > GRID_TOLERANCE || nearest < 0.0 {
            return None;
        }
        let first = nearest as usize;
        (first + n <= sed.len()).then_some(first)
    }

    fn window_mean(&self, sed: &SampledSpectrum, x: f64) -> Result<f64, PipelineError> {
        let x = x.clamp(sed.start(), sed.end());
        let low = (x - self.step / 2.0).max(sed.start());
        let high = (x + self.step / 2.0).min(sed.end());
        if high <= low {
            return Ok(sed.value_at(x));
        }
        Ok(sed.average_between(low, high)?)
    }
}

impl SpectrumTransform for Resample {
    fn name(&self) -> String {
        match self.padding {
            Some(pad) => format!(
                "resample [{}, {}] step {} (pad {pad})",
                self.start, self.end, self.step
            ),
            None => format!("resample [{}, {}] step {}", self.start, self.end, self.step),
        }
    }

    fn transform(&self, sed: &mut SampledSpectrum) -> Result<(), PipelineError> {
        if !(self.step > 0.0 && self.step.is_finite()) || self.end < self.start {
            return Err(PipelineError::InvalidParameter(format!(
                "resample range [{}, {}] with step {}",
                self.start, self.end, self.step
            )));
        }
        if self.padding.is_none() && !sed.covers(self.start, self.end) {
            return Err(PipelineError::ResampleOutOfBounds {
                start: self.start,
                end: self.end,
                min: sed.start(),
                max: sed.end(),
            });
        }

        let n = sample_count(self.start, self.end, self.step);
        if let Some(first) = self.aligned_offset(sed, n) {
            let values = sed.values()[first..first + n].to_vec();
            let start = sed.x(first);
            sed.reset(values, start, sed.sampling())?;
            return Ok(());
        }

        let tolerance = sed.sampling() * GRID_TOLERANCE;
        let mut values = Vec::with_capacity(n);
        for i in 0..n {
            let x = self.start + i as f64 * self.step;
            let inside = x >= sed.start() - tolerance && x <= sed.end() + tolerance;
            // Strict ranges were checked above; only rounding can land outside
            let value = match self.padding {
                Some(pad) if !inside => pad,
                _ => self.window_mean(sed, x)?,
            };
            values.push(value);
        }
        sed.reset(values, self.start, self.step)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wiggle() -> SampledSpectrum {
        let y = (0..100).map(|i| ((i * 7) % 13) as f64).collect();
        SampledSpectrum::new(y, 400.0, 2.0).unwrap()
    }

    #[test]
    fn test_identical_grid_is_subrange_copy() {
        let original = wiggle();
        let mut sed = original.clone();
        sed.accept(&Resample::strict(420.0, 500.0, 2.0)).unwrap();

        assert_eq!(sed.len(), 41);
        assert_eq!(sed.start(), 420.0);
        assert_eq!(sed.values(), &original.values()[10..51]);
    }

    #[test]
    fn test_full_range_copy() {
        let original = wiggle();
        let mut sed = original.clone();
        sed.accept(&Resample::strict(original.start(), original.end(), 2.0))
            .unwrap();
        assert_eq!(sed, original);
    }

    #[test]
    fn test_strict_rejects_out_of_domain() {
        let mut sed = wiggle();
        let result = sed.accept(&Resample::strict(390.0, 500.0, 2.0));
        assert!(matches!(
            result,
            Err(PipelineError::ResampleOutOfBounds { .. })
        ));
        assert_eq!(sed, wiggle());
    }

    #[test]
    fn test_downsample_linear_is_exact() {
        // Window means of a straight line equal the line at the window centre
        let y = (0..=100).map(|i| 3.0 + 0.5 * i as f64).collect();
        let mut sed = SampledSpectrum::new(y, 0.0, 1.0).unwrap();
        sed.accept(&Resample::strict(10.0, 90.0, 4.0)).unwrap();

        assert_eq!(sed.len(), 21);
        for i in 0..sed.len() {
            assert_relative_eq!(sed.y(i), 3.0 + 0.5 * sed.x(i), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_downsample_averages_window() {
        let mut sed = SampledSpectrum::new(vec![0.0, 0.0, 4.0, 0.0, 0.0], 0.0, 1.0).unwrap();
        sed.accept(&Resample::strict(2.0, 2.0, 2.0)).unwrap();
        // Mean of the triangle over [1, 3]
        assert_relative_eq!(sed.y(0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_padding_outside_domain() {
        let mut sed = SampledSpectrum::constant(5.0, 100.0, 200.0, 1.0).unwrap();
        sed.accept(&Resample::with_padding(80.0, 220.0, 10.0, 0.0))
            .unwrap();

        assert_eq!(sed.len(), 15);
        assert_eq!(sed.y(0), 0.0);
        assert_eq!(sed.y(1), 0.0);
        for i in 2..=12 {
            assert_relative_eq!(sed.y(i), 5.0, epsilon = 1e-12);
        }
        assert_eq!(sed.y(13), 0.0);
        assert_eq!(sed.y(14), 0.0);
    }

    #[test]
    fn test_invalid_step() {
        let mut sed = wiggle();
        assert!(matches!(
            sed.accept(&Resample::strict(420.0, 500.0, 0.0)),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}
