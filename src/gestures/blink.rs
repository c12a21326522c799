//! Blink detection and click arbitration.
//!
//! A blink is a run of more than `debounce_frames` closed-eye frames followed by
//! an open frame. Blinks are then paired up: the first arms the machine, a second
//! within `DOUBLE_CLICK_THRESHOLD` double-clicks, a later one single-clicks and
//! re-arms.
//!
//! A lone blink with no follow-up stays armed indefinitely unless
//! `resolve_lone_blink` is enabled.

use crate::{constants::DEFAULT_BLINK_DEBOUNCE_FRAMES, input_sink::PointerAction, params::Parameters};
use log::debug;

/// Coarse view of the machine for status displays and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    Idle,
    ClosedAccumulating,
    WaitingForSecondBlink,
}

/// Mutable blink bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlinkState {
    /// Closed frames in the current run; decays by one per open frame
    pub consecutive_closed_frames: u32,
    pub awaiting_second_click: bool,
    /// Monotonic seconds of the blink that armed the machine
    pub first_click_timestamp: f64,
}

#[derive(Debug, Clone)]
pub struct BlinkMachine {
    state: BlinkState,
    debounce_frames: u32,
    resolve_lone_blink: bool,
}

impl Default for BlinkMachine {
    fn default() -> Self {
        Self::new(DEFAULT_BLINK_DEBOUNCE_FRAMES, false)
    }
}

impl BlinkMachine {
    #[must_use]
    pub const fn new(debounce_frames: u32, resolve_lone_blink: bool) -> Self {
        Self {
            state: BlinkState {
                consecutive_closed_frames: 0,
                awaiting_second_click: false,
                first_click_timestamp: 0.0,
            },
            debounce_frames,
            resolve_lone_blink,
        }
    }

    /// Feed one frame's average EAR
    pub fn update(
        &mut self,
        ear: f64,
        blink_threshold: f64,
        now: f64,
        params: &Parameters,
    ) -> Option<PointerAction> {
        if ear < blink_threshold {
            self.state.consecutive_closed_frames += 1;
            return None;
        }

        if self.state.consecutive_closed_frames > self.debounce_frames {
            debug!(
                "Blink after {} closed frames at {now:.3}s",
                self.state.consecutive_closed_frames
            );
            self.state.consecutive_closed_frames = 0;
            return self.on_blink(now, params);
        }

        self.state.consecutive_closed_frames = self.state.consecutive_closed_frames.saturating_sub(1);

        if self.resolve_lone_blink
            && self.state.awaiting_second_click
            && now - self.state.first_click_timestamp > params.double_click_threshold
        {
            debug!("No second blink within {:.2}s, single click", params.double_click_threshold);
            self.state.awaiting_second_click = false;
            return Some(PointerAction::Click);
        }
        None
    }

    /// Arbitrate a completed blink at time `t`
    pub fn on_blink(&mut self, t: f64, params: &Parameters) -> Option<PointerAction> {
        if !self.state.awaiting_second_click {
            self.state.awaiting_second_click = true;
            self.state.first_click_timestamp = t;
            return None;
        }

        if t - self.state.first_click_timestamp <= params.double_click_threshold {
            self.state.awaiting_second_click = false;
            Some(PointerAction::DoubleClick)
        } else {
            // Stay armed with this blink as the new first one
            self.state.first_click_timestamp = t;
            Some(PointerAction::Click)
        }
    }

    #[must_use]
    pub const fn state(&self) -> &BlinkState {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> BlinkPhase {
        if self.state.consecutive_closed_frames > 0 {
            BlinkPhase::ClosedAccumulating
        } else if self.state.awaiting_second_click {
            BlinkPhase::WaitingForSecondBlink
        } else {
            BlinkPhase::Idle
        }
    }

    pub fn reset(&mut self) {
        self.state = BlinkState::default();
    }
}
