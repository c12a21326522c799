//! Mouth-open scrolling.
//!
//! Opening the mouth anchors at the current smoothed head position. The first
//! head displacement past `SCROLL_THRESHOLD` locks a direction, which then
//! repeats every `SCROLL_INTERVAL` seconds until the mouth closes.

use crate::{
    calibration::CalibrationProfile, geometry::FaceSignals, input_sink::PointerAction,
    params::Parameters,
};
use log::debug;
use nalgebra::Point2;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScrollPhase {
    #[default]
    NotScrolling,
    /// Mouth open, waiting for the head to leave the anchor
    Anchoring { anchor: Point2<f64> },
    /// Direction locked until the mouth closes
    Scrolling {
        anchor: Point2<f64>,
        direction: ScrollDirection,
        last_scroll_timestamp: f64,
    },
}

/// Transition reported alongside any emitted scroll action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTransition {
    Locked(ScrollDirection),
    Released,
}

#[derive(Debug, Clone, Default)]
pub struct ScrollMachine {
    phase: ScrollPhase,
}

/// Pick the dominant axis of `(dx, dy)`; positive y is down in frame coordinates.
fn dominant_direction(delta_x: f64, delta_y: f64) -> ScrollDirection {
    if delta_x.abs() > delta_y.abs() {
        if delta_x > 0.0 {
            ScrollDirection::Right
        } else {
            ScrollDirection::Left
        }
    } else if delta_y > 0.0 {
        ScrollDirection::Down
    } else {
        ScrollDirection::Up
    }
}

#[allow(clippy::cast_possible_truncation)] // validated finite and bounded by params
fn scroll_action(direction: ScrollDirection, step: f64) -> Option<PointerAction> {
    let step = step.round() as i32;
    match direction {
        ScrollDirection::Up => Some(PointerAction::ScrollVertical(step)),
        ScrollDirection::Down => Some(PointerAction::ScrollVertical(-step)),
        ScrollDirection::Right => Some(PointerAction::ScrollHorizontal(step)),
        ScrollDirection::Left => Some(PointerAction::ScrollHorizontal(-step)),
        ScrollDirection::None => None,
    }
}

impl ScrollMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one frame.
    ///
    /// `smoothed` is the cursor machine's smoothed head position after this
    /// frame's cursor update.
    pub fn update(
        &mut self,
        signals: &FaceSignals,
        profile: &CalibrationProfile,
        smoothed: Point2<f64>,
        now: f64,
        params: &Parameters,
    ) -> (Option<PointerAction>, Option<ScrollTransition>) {
        if signals.mouth_aperture <= profile.mouth_open_threshold {
            let released = matches!(self.phase, ScrollPhase::Scrolling { .. });
            self.phase = ScrollPhase::NotScrolling;
            return (None, released.then_some(ScrollTransition::Released));
        }

        match self.phase {
            ScrollPhase::NotScrolling => {
                debug!("Mouth open, scroll anchor at ({:.3}, {:.3})", smoothed.x, smoothed.y);
                self.phase = ScrollPhase::Anchoring { anchor: smoothed };
                (None, None)
            }
            ScrollPhase::Anchoring { anchor } => {
                let delta_x = (smoothed.x - anchor.x) * params.cursor_sensitivity_x;
                let delta_y = (smoothed.y - anchor.y) * params.cursor_sensitivity_y;
                if delta_x.abs().max(delta_y.abs()) <= params.scroll_threshold {
                    return (None, None);
                }

                let direction = dominant_direction(delta_x, delta_y);
                debug!("Scroll locked {direction}");
                self.phase = ScrollPhase::Scrolling {
                    anchor,
                    direction,
                    last_scroll_timestamp: now,
                };
                (None, Some(ScrollTransition::Locked(direction)))
            }
            ScrollPhase::Scrolling {
                anchor,
                direction,
                last_scroll_timestamp,
            } => {
                if now - last_scroll_timestamp < params.scroll_interval {
                    return (None, None);
                }
                self.phase = ScrollPhase::Scrolling {
                    anchor,
                    direction,
                    last_scroll_timestamp: now,
                };
                (scroll_action(direction, params.scroll_step), None)
            }
        }
    }

    #[must_use]
    pub const fn phase(&self) -> ScrollPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_scrolling(&self) -> bool {
        matches!(self.phase, ScrollPhase::Scrolling { .. })
    }

    #[must_use]
    pub const fn direction(&self) -> ScrollDirection {
        match self.phase {
            ScrollPhase::Scrolling { direction, .. } => direction,
            _ => ScrollDirection::None,
        }
    }

    /// Anchor while the mouth is open
    #[must_use]
    pub const fn anchor(&self) -> Option<Point2<f64>> {
        match self.phase {
            ScrollPhase::NotScrolling => None,
            ScrollPhase::Anchoring { anchor } | ScrollPhase::Scrolling { anchor, .. } => {
                Some(anchor)
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = ScrollPhase::NotScrolling;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticFace;

    fn profile() -> CalibrationProfile {
        CalibrationProfile {
            baseline_ear: 0.3,
            blink_threshold: 0.225,
            baseline_eyebrow_left: 0.0325,
            baseline_eyebrow_right: 0.0325,
            baseline_mouth_open: 0.01,
            mouth_open_threshold: 0.015,
        }
    }

    fn open_mouth() -> FaceSignals {
        FaceSignals::measure(&SyntheticFace::default().mouth_open(0.05).landmarks())
    }

    fn closed_mouth() -> FaceSignals {
        FaceSignals::measure(&SyntheticFace::default().landmarks())
    }

    #[test]
    fn test_anchor_on_open() {
        let mut scroll = ScrollMachine::new();
        let params = Parameters::default();
        let anchor = Point2::new(0.4, 0.6);
        assert_eq!(scroll.update(&open_mouth(), &profile(), anchor, 0.0, &params), (None, None));
        assert_eq!(scroll.phase(), ScrollPhase::Anchoring { anchor });
        assert_eq!(scroll.anchor(), Some(anchor));
        assert!(!scroll.is_scrolling());
    }

    #[test]
    fn test_small_motion_does_not_lock() {
        let mut scroll = ScrollMachine::new();
        let params = Parameters::default();
        scroll.update(&open_mouth(), &profile(), Point2::new(0.5, 0.5), 0.0, &params);
        // 0.003 * 8 = 0.024 < 0.03
        scroll.update(&open_mouth(), &profile(), Point2::new(0.503, 0.5), 0.1, &params);
        assert!(!scroll.is_scrolling());
    }

    #[test]
    fn test_lock_then_repeat() {
        let mut scroll = ScrollMachine::new();
        let params = Parameters::default();
        let prof = profile();
        scroll.update(&open_mouth(), &prof, Point2::new(0.5, 0.5), 0.0, &params);

        let (action, transition) =
            scroll.update(&open_mouth(), &prof, Point2::new(0.5, 0.49), 0.1, &params);
        assert_eq!(action, None);
        assert_eq!(transition, Some(ScrollTransition::Locked(ScrollDirection::Up)));
        assert_eq!(scroll.direction(), ScrollDirection::Up);

        // Too soon after the lock
        let (action, _) = scroll.update(&open_mouth(), &prof, Point2::new(0.5, 0.49), 0.12, &params);
        assert_eq!(action, None);

        let (action, _) = scroll.update(&open_mouth(), &prof, Point2::new(0.5, 0.49), 0.16, &params);
        assert_eq!(action, Some(PointerAction::ScrollVertical(50)));
    }

    #[test]
    fn test_direction_mapping() {
        assert_eq!(dominant_direction(0.1, 0.05), ScrollDirection::Right);
        assert_eq!(dominant_direction(-0.1, 0.05), ScrollDirection::Left);
        assert_eq!(dominant_direction(0.01, 0.05), ScrollDirection::Down);
        assert_eq!(dominant_direction(0.01, -0.05), ScrollDirection::Up);

        assert_eq!(scroll_action(ScrollDirection::Down, 50.0), Some(PointerAction::ScrollVertical(-50)));
        assert_eq!(scroll_action(ScrollDirection::Left, 50.0), Some(PointerAction::ScrollHorizontal(-50)));
        assert_eq!(scroll_action(ScrollDirection::Right, 80.0), Some(PointerAction::ScrollHorizontal(80)));
        assert_eq!(scroll_action(ScrollDirection::None, 50.0), None);
    }

    #[test]
    fn test_closing_mouth_releases() {
        let mut scroll = ScrollMachine::new();
        let params = Parameters::default();
        let prof = profile();
        scroll.update(&open_mouth(), &prof, Point2::new(0.5, 0.5), 0.0, &params);
        scroll.update(&open_mouth(), &prof, Point2::new(0.6, 0.5), 0.1, &params);
        assert_eq!(scroll.direction(), ScrollDirection::Right);

        let (action, transition) =
            scroll.update(&closed_mouth(), &prof, Point2::new(0.6, 0.5), 0.2, &params);
        assert_eq!(action, None);
        assert_eq!(transition, Some(ScrollTransition::Released));
        assert_eq!(scroll.phase(), ScrollPhase::NotScrolling);
        assert_eq!(scroll.anchor(), None);
    }
}
