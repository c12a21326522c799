//! Safe numeric conversions between normalized and pixel coordinates.

use crate::{Error, Result};

/// Map a normalized coordinate onto a screen axis: `dim * clip(norm, 0, 1)`
#[must_use]
#[allow(clippy::cast_possible_truncation)] // clamped into [0, dim] before the cast
pub fn to_screen(normalized: f64, dimension: u32) -> i32 {
    if !normalized.is_finite() {
        return 0;
    }
    let pixel = f64::from(dimension) * normalized.clamp(0.0, 1.0);
    (pixel as i64).clamp(0, i64::from(i32::MAX)) as i32
}

/// Safely convert usize to i32 with overflow checking
///
/// # Errors
///
/// Returns an error if the value exceeds `i32::MAX`
pub fn usize_to_i32(value: usize) -> Result<i32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} too large to fit in i32")))
}

/// Convert an `OpenCV` dimension to usize, rejecting negatives
///
/// # Errors
///
/// Returns an error for negative values
pub fn i32_to_usize(value: i32) -> Result<usize> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Negative dimension {value}")))
}
