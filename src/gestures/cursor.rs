//! Head position to absolute pointer position.

use crate::{
    constants::SMOOTHING_ORIGIN, input_sink::PointerAction, params::Parameters,
    smoothing::SmoothingState, utils::to_screen,
};
use nalgebra::Point2;

/// Smooths the head proxy and moves the pointer once it leaves the dead zone.
///
/// This is the only writer of the smoothed position; the scroll machine reads it.
#[derive(Debug, Clone, Default)]
pub struct CursorMachine {
    smoothing: SmoothingState,
}

impl CursorMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in this frame's head position and return a move if one is due
    pub fn update(
        &mut self,
        head: Point2<f64>,
        params: &Parameters,
        screen: (u32, u32),
    ) -> Option<PointerAction> {
        let smooth = self.smoothing.apply(head, params.ema_alpha);

        let delta_x = (smooth.x - SMOOTHING_ORIGIN) * params.cursor_sensitivity_x;
        let delta_y = (smooth.y - SMOOTHING_ORIGIN) * params.cursor_sensitivity_y;

        if delta_x.abs() <= params.movement_threshold && delta_y.abs() <= params.movement_threshold {
            return None;
        }

        Some(PointerAction::MoveTo {
            x: to_screen(SMOOTHING_ORIGIN + delta_x, screen.0),
            y: to_screen(SMOOTHING_ORIGIN + delta_y, screen.1),
        })
    }

    /// Smoothed head position as of the last non-blink frame
    #[must_use]
    pub fn smoothed(&self) -> Point2<f64> {
        self.smoothing.position()
    }

    pub fn reset(&mut self) {
        self.smoothing.reset();
    }
}
