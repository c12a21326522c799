//! Per-user baseline calibration.
//!
//! The user looks at the camera with a relaxed face for `CALIBRATION_FRAMES`
//! detected frames. The averaged signals become the [`CalibrationProfile`] that
//! every gesture machine compares live signals against.

use crate::{
    capture::CaptureDevice,
    controller::CancellationToken,
    geometry::FaceSignals,
    landmarks::LandmarkProvider,
    params::Parameters,
    Error, Result,
};
use log::{debug, info, warn};

/// Baselines derived from a calibration run. Replaced wholesale on recalibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    /// Average eye aspect ratio with the eyes open
    pub baseline_ear: f64,
    /// `baseline_ear * BLINK_THRESHOLD_RATIO`
    pub blink_threshold: f64,
    pub baseline_eyebrow_left: f64,
    pub baseline_eyebrow_right: f64,
    pub baseline_mouth_open: f64,
    /// `baseline_mouth_open * MOUTH_OPEN_THRESHOLD_RATIO`
    pub mouth_open_threshold: f64,
}

/// Running sums over calibration samples
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    target: usize,
    samples: usize,
    ear_sum: f64,
    eyebrow_left_sum: f64,
    eyebrow_right_sum: f64,
    mouth_sum: f64,
}

impl Calibrator {
    /// Expect exactly `frame_count` samples
    #[must_use]
    pub fn new(frame_count: usize) -> Self {
        Self {
            target: frame_count,
            ..Self::default()
        }
    }

    /// Add one detected face. Samples beyond the target are ignored.
    pub fn accumulate(&mut self, signals: &FaceSignals) {
        if self.is_complete() {
            return;
        }
        self.ear_sum += signals.ear;
        self.eyebrow_left_sum += signals.eyebrow_left;
        self.eyebrow_right_sum += signals.eyebrow_right;
        self.mouth_sum += signals.mouth_aperture;
        self.samples += 1;
    }

    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }

    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.samples >= self.target
    }

    /// Average the sums and derive thresholds
    ///
    /// # Errors
    ///
    /// Returns `CalibrationFailed` if fewer than the target samples were added
    #[allow(clippy::cast_precision_loss)] // sample counts are small
    pub fn finish(&self, params: &Parameters, attempts: usize) -> Result<CalibrationProfile> {
        if self.target == 0 || !self.is_complete() {
            return Err(Error::CalibrationFailed {
                collected: self.samples,
                required: self.target,
                attempts,
            });
        }

        let n = self.target as f64;
        let baseline_ear = self.ear_sum / n;
        let baseline_mouth_open = self.mouth_sum / n;

        Ok(CalibrationProfile {
            baseline_ear,
            blink_threshold: baseline_ear * params.blink_threshold_ratio,
            baseline_eyebrow_left: self.eyebrow_left_sum / n,
            baseline_eyebrow_right: self.eyebrow_right_sum / n,
            baseline_mouth_open,
            mouth_open_threshold: baseline_mouth_open * params.mouth_open_threshold_ratio,
        })
    }
}

/// Read frames from `device` until `CALIBRATION_FRAMES` faces have been sampled.
///
/// Gives up after `attempt_factor * CALIBRATION_FRAMES` reads so a dead camera
/// cannot stall the loop. The device is only read, never reopened or released.
///
/// # Errors
///
/// - `CalibrationFailed` when the attempt budget runs out
/// - `Cancelled` when `cancel` fires mid-run
pub fn calibrate<C, P>(
    device: &mut C,
    provider: &mut P,
    params: &Parameters,
    attempt_factor: usize,
    cancel: &CancellationToken,
) -> Result<CalibrationProfile>
where
    C: CaptureDevice + ?Sized,
    P: LandmarkProvider<C::Frame> + ?Sized,
{
    let frame_count = params.calibration_frames;
    let max_attempts = frame_count.saturating_mul(attempt_factor.max(1));
    let mut calibrator = Calibrator::new(frame_count);
    let mut attempts = 0;

    info!("Calibrating over {frame_count} frames (at most {max_attempts} reads)");

    while !calibrator.is_complete() && attempts < max_attempts {
        if cancel.is_cancelled() {
            info!("Calibration cancelled after {} samples", calibrator.samples());
            return Err(Error::Cancelled);
        }
        attempts += 1;

        let frame = match device.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                debug!("Calibration frame read failed: {e}");
                continue;
            }
        };

        match provider.detect(&frame) {
            Ok(Some(landmarks)) => calibrator.accumulate(&FaceSignals::measure(&landmarks)),
            Ok(None) => {}
            Err(e) => warn!("Landmark detection failed during calibration: {e}"),
        }
    }

    let profile = calibrator.finish(params, attempts)?;
    info!(
        "Calibration complete: EAR {:.3} (blink < {:.3}), mouth {:.4} (open > {:.4}), brows {:.4}/{:.4}",
        profile.baseline_ear,
        profile.blink_threshold,
        profile.baseline_mouth_open,
        profile.mouth_open_threshold,
        profile.baseline_eyebrow_left,
        profile.baseline_eyebrow_right,
    );
    Ok(profile)
}
