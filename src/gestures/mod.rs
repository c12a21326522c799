//! Per-frame gesture recognition.
//!
//! [`GestureEngine`] owns the four machines and runs them in a fixed order on
//! every frame: cursor, blink, eyebrow, then scroll. Cursor runs first so that
//! the scroll machine sees this frame's smoothed head position. Actions are sent
//! to the [`InputSink`] as soon as they are produced.

pub mod blink;
pub mod cursor;
pub mod eyebrow;
pub mod scroll;

pub use blink::{BlinkMachine, BlinkPhase, BlinkState};
pub use cursor::CursorMachine;
pub use eyebrow::EyebrowMachine;
pub use scroll::{ScrollDirection, ScrollMachine, ScrollPhase, ScrollTransition};

use crate::{
    calibration::CalibrationProfile,
    constants::DEFAULT_BLINK_DEBOUNCE_FRAMES,
    geometry::FaceSignals,
    input_sink::{InputSink, PointerAction},
    landmarks::LandmarkSet,
    params::Parameters,
};
use log::{trace, warn};

/// User-visible gesture notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Click,
    DoubleClick,
    RightClick,
    ScrollLocked(ScrollDirection),
    ScrollReleased,
}

/// Knobs that are fixed for the life of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureOptions {
    /// Closed frames a blink must exceed
    pub blink_debounce_frames: u32,
    /// Click on a lone blink once the double-click window lapses
    pub resolve_lone_blink: bool,
}

impl Default for GestureOptions {
    fn default() -> Self {
        Self {
            blink_debounce_frames: DEFAULT_BLINK_DEBOUNCE_FRAMES,
            resolve_lone_blink: false,
        }
    }
}

/// What one frame produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub actions: Vec<PointerAction>,
    pub events: Vec<GestureEvent>,
    /// EAR was under the blink threshold, so the cursor held still
    pub blink_frame: bool,
}

impl FrameOutcome {
    fn push(&mut self, action: PointerAction) {
        let event = match action {
            PointerAction::Click => Some(GestureEvent::Click),
            PointerAction::DoubleClick => Some(GestureEvent::DoubleClick),
            PointerAction::RightClick => Some(GestureEvent::RightClick),
            _ => None,
        };
        self.actions.push(action);
        self.events.extend(event);
    }
}

#[derive(Debug, Clone)]
pub struct GestureEngine {
    profile: CalibrationProfile,
    cursor: CursorMachine,
    blink: BlinkMachine,
    eyebrow: EyebrowMachine,
    scroll: ScrollMachine,
}

impl GestureEngine {
    #[must_use]
    pub fn new(profile: CalibrationProfile, options: GestureOptions) -> Self {
        Self {
            profile,
            cursor: CursorMachine::new(),
            blink: BlinkMachine::new(options.blink_debounce_frames, options.resolve_lone_blink),
            eyebrow: EyebrowMachine::new(),
            scroll: ScrollMachine::new(),
        }
    }

    /// Swap in a fresh profile and reset every machine
    pub fn recalibrate(&mut self, profile: CalibrationProfile) {
        self.profile = profile;
        self.cursor.reset();
        self.blink.reset();
        self.eyebrow.reset();
        self.scroll.reset();
    }

    /// Run every machine on one frame and dispatch the resulting actions.
    ///
    /// A frame without a face changes nothing. Sink errors are logged and do not
    /// abort the frame.
    pub fn process<S>(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        now: f64,
        params: &Parameters,
        sink: &mut S,
    ) -> FrameOutcome
    where
        S: InputSink + ?Sized,
    {
        let mut outcome = FrameOutcome::default();
        let Some(landmarks) = landmarks else {
            return outcome;
        };
        let signals = FaceSignals::measure(landmarks);
        trace!(
            "EAR {:.3}, mouth {:.4}, brows {:.4}/{:.4}",
            signals.ear,
            signals.mouth_aperture,
            signals.eyebrow_left,
            signals.eyebrow_right
        );

        // Eyes closing drag the landmarks; hold the pointer still.
        outcome.blink_frame = signals.ear < self.profile.blink_threshold;
        if !outcome.blink_frame {
            if let Some(action) = self.cursor.update(signals.head, params, sink.screen_size()) {
                outcome.push(action);
            }
        }

        if let Some(action) = self.blink.update(signals.ear, self.profile.blink_threshold, now, params) {
            outcome.push(action);
        }

        if let Some(action) = self.eyebrow.update(&signals, &self.profile, now, params) {
            outcome.push(action);
        }

        let (scroll_action, transition) =
            self.scroll.update(&signals, &self.profile, self.cursor.smoothed(), now, params);
        match transition {
            Some(ScrollTransition::Locked(direction)) => {
                outcome.events.push(GestureEvent::ScrollLocked(direction));
            }
            Some(ScrollTransition::Released) => outcome.events.push(GestureEvent::ScrollReleased),
            None => {}
        }
        if let Some(action) = scroll_action {
            outcome.push(action);
        }

        for action in &outcome.actions {
            if let Err(e) = sink.perform(*action) {
                warn!("Failed to perform {action:?}: {e}");
            }
        }
        outcome
    }

    #[must_use]
    pub const fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    #[must_use]
    pub const fn cursor(&self) -> &CursorMachine {
        &self.cursor
    }

    #[must_use]
    pub const fn blink(&self) -> &BlinkMachine {
        &self.blink
    }

    #[must_use]
    pub const fn eyebrow(&self) -> &EyebrowMachine {
        &self.eyebrow
    }

    #[must_use]
    pub const fn scroll(&self) -> &ScrollMachine {
        &self.scroll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{input_sink::RecordingSink, synthetic::SyntheticFace};

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

    #[test]
    fn test_no_face_is_noop() {
        let mut engine = GestureEngine::new(profile(), GestureOptions::default());
        let mut sink = RecordingSink::default();
        let outcome = engine.process(None, 0.0, &Parameters::default(), &mut sink);
        assert_eq!(outcome, FrameOutcome::default());
        assert!(sink.actions().is_empty());
    }

    #[test]
    fn test_rest_face_produces_nothing() {
        let mut engine = GestureEngine::new(profile(), GestureOptions::default());
        let mut sink = RecordingSink::default();
        let face = SyntheticFace::default().landmarks();
        for i in 0..10 {
            engine.process(Some(&face), f64::from(i) * 0.03, &Parameters::default(), &mut sink);
        }
        assert!(sink.actions().is_empty());
    }

    #[test]
    fn test_blink_frame_holds_cursor() {
        let mut engine = GestureEngine::new(profile(), GestureOptions::default());
        let mut sink = RecordingSink::default();
        let params = Parameters {
            ema_alpha: 1.0,
            ..Parameters::default()
        };
        let closed = SyntheticFace::default().head(0.7, 0.5).eye_openness(0.2).landmarks();
        let outcome = engine.process(Some(&closed), 0.0, &params, &mut sink);
        assert!(outcome.blink_frame);
        assert!(outcome.actions.is_empty());
        assert_eq!(engine.cursor().smoothed(), nalgebra::Point2::new(0.5, 0.5));
    }

    #[test]
    fn test_right_click_event() {
        let mut engine = GestureEngine::new(profile(), GestureOptions::default());
        let mut sink = RecordingSink::default();
        let raised = SyntheticFace::default().brow_raise(0.02).landmarks();
        let outcome = engine.process(Some(&raised), 0.0, &Parameters::default(), &mut sink);
        assert_eq!(outcome.events, vec![GestureEvent::RightClick]);
        assert_eq!(sink.actions(), vec![PointerAction::RightClick]);
    }

    #[test]
    fn test_recalibrate_resets_machines() {
        let mut engine = GestureEngine::new(profile(), GestureOptions::default());
        let mut sink = RecordingSink::default();
        let open = SyntheticFace::default().mouth_open(0.05).landmarks();
        engine.process(Some(&open), 0.0, &Parameters::default(), &mut sink);
        assert!(engine.scroll().anchor().is_some());

        let mut fresh = profile();
        fresh.baseline_ear = 0.28;
        engine.recalibrate(fresh);
        assert_eq!(engine.profile().baseline_ear, 0.28);
        assert_eq!(engine.scroll().anchor(), None);
        assert_eq!(engine.blink().phase(), BlinkPhase::Idle);
    }
}
