//! Live-tunable engine parameters.
//!
//! The controller owns one [`Parameters`] value. Updates arrive by name from the
//! UI, are validated here, and take effect on the next processed frame.

use crate::{
    constants::{
        DEFAULT_BLINK_THRESHOLD_RATIO, DEFAULT_CALIBRATION_FRAMES, DEFAULT_CURSOR_SENSITIVITY,
        DEFAULT_DOUBLE_CLICK_THRESHOLD, DEFAULT_EMA_ALPHA, DEFAULT_EYEBROW_RAISE_THRESHOLD_RATIO,
        DEFAULT_MOUTH_OPEN_THRESHOLD_RATIO, DEFAULT_MOVEMENT_THRESHOLD, DEFAULT_RIGHT_CLICK_COOLDOWN,
        DEFAULT_SCROLL_INTERVAL, DEFAULT_SCROLL_STEP, DEFAULT_SCROLL_THRESHOLD,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Upper bound on calibration length, about a minute of video
const MAX_CALIBRATION_FRAMES: f64 = 1800.0;

/// Recognised parameter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterName {
    EmaAlpha,
    CursorSensitivityX,
    CursorSensitivityY,
    BlinkThresholdRatio,
    CalibrationFrames,
    MovementThreshold,
    DoubleClickThreshold,
    EyebrowRaiseThresholdRatio,
    RightClickCooldown,
    MouthOpenThresholdRatio,
    ScrollThreshold,
    ScrollStep,
    ScrollInterval,
}

/// Accepted value range for a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// `0 < v <= 1`
    UnitInterval,
    /// `v > 0`
    Positive,
    /// `v >= 0`
    NonNegative,
    /// whole number `1..=MAX_CALIBRATION_FRAMES`
    FrameCount,
}

impl ParameterName {
    pub const ALL: [Self; 13] = [
        Self::EmaAlpha,
        Self::CursorSensitivityX,
        Self::CursorSensitivityY,
        Self::BlinkThresholdRatio,
        Self::CalibrationFrames,
        Self::MovementThreshold,
        Self::DoubleClickThreshold,
        Self::EyebrowRaiseThresholdRatio,
        Self::RightClickCooldown,
        Self::MouthOpenThresholdRatio,
        Self::ScrollThreshold,
        Self::ScrollStep,
        Self::ScrollInterval,
    ];

    /// Canonical upper-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmaAlpha => "EMA_ALPHA",
            Self::CursorSensitivityX => "CURSOR_SENSITIVITY_X",
            Self::CursorSensitivityY => "CURSOR_SENSITIVITY_Y",
            Self::BlinkThresholdRatio => "BLINK_THRESHOLD_RATIO",
            Self::CalibrationFrames => "CALIBRATION_FRAMES",
            Self::MovementThreshold => "MOVEMENT_THRESHOLD",
            Self::DoubleClickThreshold => "DOUBLE_CLICK_THRESHOLD",
            Self::EyebrowRaiseThresholdRatio => "EYEBROW_RAISE_THRESHOLD_RATIO",
            Self::RightClickCooldown => "RIGHT_CLICK_COOLDOWN",
            Self::MouthOpenThresholdRatio => "MOUTH_OPEN_THRESHOLD_RATIO",
            Self::ScrollThreshold => "SCROLL_THRESHOLD",
            Self::ScrollStep => "SCROLL_STEP",
            Self::ScrollInterval => "SCROLL_INTERVAL",
        }
    }

    const fn bound(self) -> Bound {
        match self {
            Self::EmaAlpha => Bound::UnitInterval,
            Self::CursorSensitivityX
            | Self::CursorSensitivityY
            | Self::BlinkThresholdRatio
            | Self::EyebrowRaiseThresholdRatio
            | Self::MouthOpenThresholdRatio
            | Self::ScrollStep => Bound::Positive,
            Self::CalibrationFrames => Bound::FrameCount,
            Self::MovementThreshold
            | Self::DoubleClickThreshold
            | Self::RightClickCooldown
            | Self::ScrollThreshold
            | Self::ScrollInterval => Bound::NonNegative,
        }
    }

    /// Check `value` against this parameter's range
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameterValue` describing the violated bound
    pub fn validate(self, value: f64) -> Result<()> {
        let reason = if !value.is_finite() {
            Some("must be a finite number")
        } else {
            match self.bound() {
                Bound::UnitInterval if value <= 0.0 || value > 1.0 => Some("must be in (0, 1]"),
                Bound::Positive if value <= 0.0 => Some("must be greater than 0"),
                Bound::NonNegative if value < 0.0 => Some("must not be negative"),
                Bound::FrameCount if value < 1.0 || value.fract() != 0.0 => {
                    Some("must be a whole number of at least 1")
                }
                Bound::FrameCount if value > MAX_CALIBRATION_FRAMES => Some("must be at most 1800"),
                _ => None,
            }
        };

        match reason {
            Some(reason) => Err(Error::InvalidParameterValue {
                name: self.as_str().to_string(),
                value,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownParameter(wanted.to_string()))
    }
}

/// The tunable knobs of the gesture engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Parameters {
    /// Smoothing factor for the head-position EMA
    pub ema_alpha: f64,
    pub cursor_sensitivity_x: f64,
    pub cursor_sensitivity_y: f64,
    /// Fraction of the baseline EAR below which the eyes count as closed
    pub blink_threshold_ratio: f64,
    /// Face samples needed to finish calibration
    pub calibration_frames: usize,
    /// Dead zone around the center, in sensitivity-scaled units
    pub movement_threshold: f64,
    /// Seconds between two blinks for a double click
    pub double_click_threshold: f64,
    pub eyebrow_raise_threshold_ratio: f64,
    /// Minimum seconds between right clicks
    pub right_click_cooldown: f64,
    pub mouth_open_threshold_ratio: f64,
    /// Head travel from the anchor that locks a scroll direction
    pub scroll_threshold: f64,
    /// Magnitude of each scroll step
    pub scroll_step: f64,
    /// Seconds between scroll steps
    pub scroll_interval: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            ema_alpha: DEFAULT_EMA_ALPHA,
            cursor_sensitivity_x: DEFAULT_CURSOR_SENSITIVITY,
            cursor_sensitivity_y: DEFAULT_CURSOR_SENSITIVITY,
            blink_threshold_ratio: DEFAULT_BLINK_THRESHOLD_RATIO,
            calibration_frames: DEFAULT_CALIBRATION_FRAMES,
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            double_click_threshold: DEFAULT_DOUBLE_CLICK_THRESHOLD,
            eyebrow_raise_threshold_ratio: DEFAULT_EYEBROW_RAISE_THRESHOLD_RATIO,
            right_click_cooldown: DEFAULT_RIGHT_CLICK_COOLDOWN,
            mouth_open_threshold_ratio: DEFAULT_MOUTH_OPEN_THRESHOLD_RATIO,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            scroll_step: DEFAULT_SCROLL_STEP,
            scroll_interval: DEFAULT_SCROLL_INTERVAL,
        }
    }
}

impl Parameters {
    /// Current value of `name`
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // frame counts are far below 2^52
    pub fn get(&self, name: ParameterName) -> f64 {
        match name {
            ParameterName::EmaAlpha => self.ema_alpha,
            ParameterName::CursorSensitivityX => self.cursor_sensitivity_x,
            ParameterName::CursorSensitivityY => self.cursor_sensitivity_y,
            ParameterName::BlinkThresholdRatio => self.blink_threshold_ratio,
            ParameterName::CalibrationFrames => self.calibration_frames as f64,
            ParameterName::MovementThreshold => self.movement_threshold,
            ParameterName::DoubleClickThreshold => self.double_click_threshold,
            ParameterName::EyebrowRaiseThresholdRatio => self.eyebrow_raise_threshold_ratio,
            ParameterName::RightClickCooldown => self.right_click_cooldown,
            ParameterName::MouthOpenThresholdRatio => self.mouth_open_threshold_ratio,
            ParameterName::ScrollThreshold => self.scroll_threshold,
            ParameterName::ScrollStep => self.scroll_step,
            ParameterName::ScrollInterval => self.scroll_interval,
        }
    }

    /// Validate and assign. On error the previous value is kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameterValue` if `value` is out of range
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // validated whole number
    pub fn set(&mut self, name: ParameterName, value: f64) -> Result<()> {
        name.validate(value)?;
        match name {
            ParameterName::EmaAlpha => self.ema_alpha = value,
            ParameterName::CursorSensitivityX => self.cursor_sensitivity_x = value,
            ParameterName::CursorSensitivityY => self.cursor_sensitivity_y = value,
            ParameterName::BlinkThresholdRatio => self.blink_threshold_ratio = value,
            ParameterName::CalibrationFrames => self.calibration_frames = value as usize,
            ParameterName::MovementThreshold => self.movement_threshold = value,
            ParameterName::DoubleClickThreshold => self.double_click_threshold = value,
            ParameterName::EyebrowRaiseThresholdRatio => self.eyebrow_raise_threshold_ratio = value,
            ParameterName::RightClickCooldown => self.right_click_cooldown = value,
            ParameterName::MouthOpenThresholdRatio => self.mouth_open_threshold_ratio = value,
            ParameterName::ScrollThreshold => self.scroll_threshold = value,
            ParameterName::ScrollStep => self.scroll_step = value,
            ParameterName::ScrollInterval => self.scroll_interval = value,
        }
        Ok(())
    }

    /// Set by textual name, as the UI does
    ///
    /// # Errors
    ///
    /// `UnknownParameter` for unrecognised names, `InvalidParameterValue` for bad values
    pub fn update(&mut self, name: &str, value: f64) -> Result<ParameterName> {
        let name: ParameterName = name.parse()?;
        self.set(name, value)?;
        Ok(name)
    }

    /// Check every field, e.g. after loading from a file
    ///
    /// # Errors
    ///
    /// Returns the first `InvalidParameterValue` found
    pub fn validate(&self) -> Result<()> {
        ParameterName::ALL
            .into_iter()
            .try_for_each(|name| name.validate(self.get(name)))
    }

    /// `(name, value)` pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (ParameterName, f64)> + '_ {
        ParameterName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }
}
