//! Eyebrow raise to right click, with a refractory cooldown.

use crate::{
    calibration::CalibrationProfile, geometry::FaceSignals, input_sink::PointerAction,
    params::Parameters,
};

/// Fires on a single qualifying frame; raises are usually held, so no debounce.
#[derive(Debug, Clone, Default)]
pub struct EyebrowMachine {
    last_right_click_timestamp: Option<f64>,
}

impl EyebrowMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        signals: &FaceSignals,
        profile: &CalibrationProfile,
        now: f64,
        params: &Parameters,
    ) -> Option<PointerAction> {
        let ratio = params.eyebrow_raise_threshold_ratio;
        let raised = signals.eyebrow_left > profile.baseline_eyebrow_left * ratio
            || signals.eyebrow_right > profile.baseline_eyebrow_right * ratio;
        if !raised {
            return None;
        }

        let cooled_down = self
            .last_right_click_timestamp
            .map_or(true, |last| now - last > params.right_click_cooldown);
        if !cooled_down {
            return None;
        }

        self.last_right_click_timestamp = Some(now);
        Some(PointerAction::RightClick)
    }

    #[must_use]
    pub const fn last_right_click_timestamp(&self) -> Option<f64> {
        self.last_right_click_timestamp
    }

    pub fn reset(&mut self) {
        self.last_right_click_timestamp = None;
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

    #[test]
    fn test_rest_does_not_fire() {
        let mut machine = EyebrowMachine::new();
        let signals = FaceSignals::measure(&SyntheticFace::default().landmarks());
        assert_eq!(machine.update(&signals, &profile(), 0.0, &Parameters::default()), None);
    }

    #[test]
    fn test_cooldown() {
        let mut machine = EyebrowMachine::new();
        let params = Parameters::default();
        let raised = FaceSignals::measure(&SyntheticFace::default().brow_raise(0.02).landmarks());

        assert_eq!(machine.update(&raised, &profile(), 0.0, &params), Some(PointerAction::RightClick));
        assert_eq!(machine.update(&raised, &profile(), 0.2, &params), None);
        assert_eq!(machine.update(&raised, &profile(), 1.0, &params), None);
        assert_eq!(machine.update(&raised, &profile(), 1.01, &params), Some(PointerAction::RightClick));
        assert_eq!(machine.last_right_click_timestamp(), Some(1.01));
    }

    #[test]
    fn test_one_side_is_enough() {
        let mut machine = EyebrowMachine::new();
        let mut signals = FaceSignals::measure(&SyntheticFace::default().landmarks());
        signals.eyebrow_right = 0.05;
        assert_eq!(
            machine.update(&signals, &profile(), 3.0, &Parameters::default()),
            Some(PointerAction::RightClick)
        );
    }
}
