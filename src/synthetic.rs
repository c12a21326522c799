//! Parametric synthetic face.
//!
//! Produces landmark sets with controllable eye openness, brow raise, mouth
//! aperture and head position. Used by the test suites and the benchmarks.
//!
//! At the defaults the face measures EAR 0.3, mouth aperture 0.01 and a head
//! proxy at the frame center.

use crate::{
    constants::{
        LEFT_EYEBROW, LEFT_EYE_EAR, LEFT_EYE_TOP, LOWER_INNER_LIP, NUM_FACE_MESH_LANDMARKS,
        RIGHT_EYEBROW, RIGHT_EYE_EAR, RIGHT_EYE_TOP, UPPER_INNER_LIP,
    },
    landmarks::LandmarkSet,
};
use nalgebra::Point2;

const EYE_OFFSET_X: f64 = 0.06;
const EYE_HALF_WIDTH: f64 = 0.025;
const LID_OFFSET_X: f64 = 0.008;
const OPEN_EYE_HEIGHT: f64 = 0.015;
const BROW_GAP: f64 = 0.04;
const MOUTH_OFFSET_Y: f64 = 0.12;

/// Builder for a single synthetic face
#[derive(Debug, Clone, Copy)]
pub struct SyntheticFace {
    head_x: f64,
    head_y: f64,
    eye_openness: f64,
    brow_raise: f64,
    mouth_aperture: f64,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            head_x: 0.5,
            head_y: 0.5,
            eye_openness: 1.0,
            brow_raise: 0.0,
            mouth_aperture: 0.01,
        }
    }
}

impl SyntheticFace {
    /// Position of the inner-eye midpoint
    #[must_use]
    pub const fn head(mut self, x: f64, y: f64) -> Self {
        self.head_x = x;
        self.head_y = y;
        self
    }

    /// 1.0 is a relaxed open eye, 0.0 fully shut
    #[must_use]
    pub const fn eye_openness(mut self, openness: f64) -> Self {
        self.eye_openness = openness;
        self
    }

    /// Extra lift of both brows, in normalized units
    #[must_use]
    pub const fn brow_raise(mut self, raise: f64) -> Self {
        self.brow_raise = raise;
        self
    }

    /// Gap between the inner lips
    #[must_use]
    pub const fn mouth_open(mut self, aperture: f64) -> Self {
        self.mouth_aperture = aperture;
        self
    }

    /// Render the landmark set
    #[must_use]
    pub fn landmarks(&self) -> LandmarkSet {
        let (hx, hy) = (self.head_x, self.head_y);
        let mut points = vec![Point2::new(hx, hy); NUM_FACE_MESH_LANDMARKS];
        let half_height = OPEN_EYE_HEIGHT * self.eye_openness / 2.0;

        // p1 and p4 are the corners, p2/p3 the upper lid, p5/p6 the lower lid
        for (indices, center_x) in [(RIGHT_EYE_EAR, hx - EYE_OFFSET_X), (LEFT_EYE_EAR, hx + EYE_OFFSET_X)] {
            points[indices[0]] = Point2::new(center_x - EYE_HALF_WIDTH, hy);
            points[indices[3]] = Point2::new(center_x + EYE_HALF_WIDTH, hy);
            points[indices[1]] = Point2::new(center_x - LID_OFFSET_X, hy - half_height);
            points[indices[2]] = Point2::new(center_x + LID_OFFSET_X, hy - half_height);
            points[indices[4]] = Point2::new(center_x + LID_OFFSET_X, hy + half_height);
            points[indices[5]] = Point2::new(center_x - LID_OFFSET_X, hy + half_height);
        }

        points[RIGHT_EYE_TOP] = Point2::new(hx - EYE_OFFSET_X, hy - half_height);
        points[LEFT_EYE_TOP] = Point2::new(hx + EYE_OFFSET_X, hy - half_height);

        let brow_y = hy - BROW_GAP - self.brow_raise;
        for (i, &index) in RIGHT_EYEBROW.iter().enumerate() {
            points[index] = Point2::new(hx - EYE_OFFSET_X - 0.02 + 0.01 * i as f64, brow_y);
        }
        for (i, &index) in LEFT_EYEBROW.iter().enumerate() {
            points[index] = Point2::new(hx + EYE_OFFSET_X - 0.02 + 0.01 * i as f64, brow_y);
        }

        let mouth_y = hy + MOUTH_OFFSET_Y;
        points[UPPER_INNER_LIP] = Point2::new(hx, mouth_y - self.mouth_aperture / 2.0);
        points[LOWER_INNER_LIP] = Point2::new(hx, mouth_y + self.mouth_aperture / 2.0);

        LandmarkSet::from_mesh(points)
    }
}
