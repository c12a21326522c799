//! Exponential smoothing of the head-position proxy.

use crate::constants::SMOOTHING_ORIGIN;
use nalgebra::Point2;

/// Exponential moving average over normalized `(x, y)`.
///
/// Starts at the frame center rather than at the first sample, so the pointer
/// eases in from the middle of the screen after (re)calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingState {
    prev_smooth_x: f64,
    prev_smooth_y: f64,
}

impl Default for SmoothingState {
    fn default() -> Self {
        Self {
            prev_smooth_x: SMOOTHING_ORIGIN,
            prev_smooth_y: SMOOTHING_ORIGIN,
        }
    }
}

impl SmoothingState {
    /// Fold in a raw sample: `smooth = alpha * raw + (1 - alpha) * prev` per axis
    pub fn apply(&mut self, raw: Point2<f64>, alpha: f64) -> Point2<f64> {
        self.prev_smooth_x = alpha * raw.x + (1.0 - alpha) * self.prev_smooth_x;
        self.prev_smooth_y = alpha * raw.y + (1.0 - alpha) * self.prev_smooth_y;
        self.position()
    }

    /// Last smoothed value
    #[must_use]
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.prev_smooth_x, self.prev_smooth_y)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
