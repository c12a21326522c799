//! Pure geometry over a landmark set.
//!
//! All functions are stateless; [`FaceSignals::measure`] computes every signal
//! once per frame so that each gesture machine reads the same snapshot.

use crate::{
    constants::{
        EPSILON, LEFT_EYEBROW, LEFT_EYE_EAR, LEFT_EYE_INNER, LEFT_EYE_TOP, LOWER_INNER_LIP,
        RIGHT_EYEBROW, RIGHT_EYE_EAR, RIGHT_EYE_INNER, RIGHT_EYE_TOP, UPPER_INNER_LIP,
    },
    landmarks::LandmarkSet,
};
use nalgebra::{distance, Point2};

/// Eye aspect ratio for the six points `p1..p6`.
///
/// `EAR = (|p2-p6| + |p3-p5|) / (2 |p1-p4|)`. A collapsed eye width yields 0.
#[must_use]
pub fn eye_aspect_ratio(landmarks: &LandmarkSet, indices: &[usize; 6]) -> f64 {
    let p = |i: usize| landmarks.point(indices[i]);

    let horizontal = distance(&p(0), &p(3));
    if horizontal < EPSILON {
        return 0.0;
    }

    let vertical = distance(&p(1), &p(5)) + distance(&p(2), &p(4));
    vertical / (2.0 * horizontal)
}

/// Mean of both eyes' aspect ratios
#[must_use]
pub fn average_ear(landmarks: &LandmarkSet) -> f64 {
    (eye_aspect_ratio(landmarks, &LEFT_EYE_EAR) + eye_aspect_ratio(landmarks, &RIGHT_EYE_EAR)) / 2.0
}

/// Vertical gap between the inner lips
#[must_use]
pub fn mouth_aperture(landmarks: &LandmarkSet) -> f64 {
    (landmarks.point(LOWER_INNER_LIP).y - landmarks.point(UPPER_INNER_LIP).y).abs()
}

/// `eyeY - mean(browY)`; grows as the brow lifts away from the eye
#[must_use]
pub fn eyebrow_distance(landmarks: &LandmarkSet, brow: &[usize], eye_top: usize) -> f64 {
    let brow_y = brow.iter().map(|&i| landmarks.point(i).y).sum::<f64>() / brow.len() as f64;
    landmarks.point(eye_top).y - brow_y
}

/// Midpoint of the inner eye corners
#[must_use]
pub fn head_position(landmarks: &LandmarkSet) -> Point2<f64> {
    nalgebra::center(&landmarks.point(RIGHT_EYE_INNER), &landmarks.point(LEFT_EYE_INNER))
}

/// Every per-frame signal the gesture machines consume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSignals {
    pub left_ear: f64,
    pub right_ear: f64,
    /// Mean of `left_ear` and `right_ear`
    pub ear: f64,
    pub eyebrow_left: f64,
    pub eyebrow_right: f64,
    pub mouth_aperture: f64,
    /// Raw head-position proxy in normalized frame coordinates
    pub head: Point2<f64>,
}

impl FaceSignals {
    #[must_use]
    pub fn measure(landmarks: &LandmarkSet) -> Self {
        let left_ear = eye_aspect_ratio(landmarks, &LEFT_EYE_EAR);
        let right_ear = eye_aspect_ratio(landmarks, &RIGHT_EYE_EAR);
        Self {
            left_ear,
            right_ear,
            ear: (left_ear + right_ear) / 2.0,
            eyebrow_left: eyebrow_distance(landmarks, &LEFT_EYEBROW, LEFT_EYE_TOP),
            eyebrow_right: eyebrow_distance(landmarks, &RIGHT_EYEBROW, RIGHT_EYE_TOP),
            mouth_aperture: mouth_aperture(landmarks),
            head: head_position(landmarks),
        }
    }
}
