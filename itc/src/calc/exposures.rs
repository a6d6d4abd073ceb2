//! Validation of the number of exposures that contain the source.

use super::CalcError;

/// Largest allowed distance between `exposures × fraction` and an integer.
pub const SOURCE_FRACTION_TOLERANCE: f64 = 0.2;

/// Number of on-source exposures implied by a dither pattern.
///
/// A fraction of 0.5 over 5 exposures would put the source in 2.5 frames,
/// which no real observation can do, so anything further than
/// [`SOURCE_FRACTION_TOLERANCE`] from a whole number is rejected.
pub fn check_source_fraction(exposures: u32, fraction: f64) -> Result<f64, CalcError> {
    let product = exposures as f64 * fraction;
    if !(fraction > 0.0 && fraction <= 1.0)
        || (product - product.round()).abs() > SOURCE_FRACTION_TOLERANCE
    {
        return Err(CalcError::NonIntegralExposures {
            exposures,
            fraction,
            product,
        });
    }
    Ok(product)
}
