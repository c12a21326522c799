//! Facial landmark sets and the provider seam.
//!
//! A [`LandmarkSet`] is one detected face in one frame: an indexed sequence of
//! points normalized to the frame, `(0, 0)` top-left and `(1, 1)` bottom-right.

use crate::{constants::NUM_FACE_MESH_LANDMARKS, Error, Result};
use nalgebra::Point2;

/// Normalized facial keypoints for a single face
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point2<f64>>,
}

impl LandmarkSet {
    /// Build a landmark set, rejecting sets smaller than the face-mesh layout
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when fewer than 468 points are supplied
    pub fn new(points: Vec<Point2<f64>>) -> Result<Self> {
        if points.len() < NUM_FACE_MESH_LANDMARKS {
            return Err(Error::InvalidInput(format!(
                "expected at least {NUM_FACE_MESH_LANDMARKS} landmarks, got {}",
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// Wrap points already known to cover the full mesh
    pub(crate) fn from_mesh(points: Vec<Point2<f64>>) -> Self {
        debug_assert!(points.len() >= NUM_FACE_MESH_LANDMARKS);
        Self { points }
    }

    /// Build from raw `(x, y)` pairs
    ///
    /// # Errors
    ///
    /// Same as [`LandmarkSet::new`]
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        Self::new(pairs.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    /// Point at `index`. Indices used by the engine are always below 468.
    #[must_use]
    pub fn point(&self, index: usize) -> Point2<f64> {
        self.points[index]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }
}

/// Turns a captured frame into at most one landmark set.
///
/// `Ok(None)` means no face was found; the frame becomes a no-op.
pub trait LandmarkProvider<F>: Send {
    /// Detect the face in `frame`
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails; the controller skips the frame
    fn detect(&mut self, frame: &F) -> Result<Option<LandmarkSet>>;
}

/// Provider for frames that already carry their landmarks (replays, tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughProvider;

impl LandmarkProvider<Option<LandmarkSet>> for PassThroughProvider {
    fn detect(&mut self, frame: &Option<LandmarkSet>) -> Result<Option<LandmarkSet>> {
        Ok(frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_sets() {
        let result = LandmarkSet::from_pairs(&[(0.5, 0.5); 10]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_accepts_refined_mesh() {
        // Refined meshes append iris points after the base 468
        let set = LandmarkSet::from_pairs(&[(0.1, 0.2); 478]).unwrap();
        assert_eq!(set.len(), 478);
        assert_eq!(set.point(477), Point2::new(0.1, 0.2));
    }

    #[test]
    fn test_pass_through_provider() {
        let set = LandmarkSet::from_pairs(&[(0.5, 0.5); 468]).unwrap();
        let mut provider = PassThroughProvider;
        assert_eq!(provider.detect(&Some(set.clone())).unwrap(), Some(set));
        assert_eq!(provider.detect(&None).unwrap(), None);
    }
}
