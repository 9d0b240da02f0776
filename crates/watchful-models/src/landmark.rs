//! Facial landmarks produced by a landmark model.
//!
//! Landmarks are indexed the way the model emits them (MediaPipe face mesh:
//! 468 points, 478 with refined iris landmarks). Coordinates are in
//! frame-pixel space.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single landmark point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Depth, when the model provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Landmark {
    /// Create a 2D landmark.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Create a 3D landmark.
    pub fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Absolute vertical pixel distance to another landmark.
    pub fn vertical_distance(&self, other: &Landmark) -> f64 {
        (self.y - other.y).abs()
    }
}

/// Head rotation angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct HeadRotation {
    /// Left/right turn (rotation about the vertical axis)
    pub yaw: Option<f64>,
    /// Up/down nod
    pub pitch: Option<f64>,
    /// Sideways tilt (rotation about the viewing axis)
    pub roll: Option<f64>,
}

impl HeadRotation {
    pub fn new(yaw: f64, roll: f64) -> Self {
        Self {
            yaw: Some(yaw),
            pitch: None,
            roll: Some(roll),
        }
    }
}

/// One detected face.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FaceSample {
    /// Landmarks in model order
    pub landmarks: Vec<Landmark>,
    /// Head rotation, when the model estimates it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<HeadRotation>,
}

impl FaceSample {
    /// Create a face sample without rotation.
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            rotation: None,
        }
    }

    /// Attach head rotation angles.
    pub fn with_rotation(mut self, rotation: HeadRotation) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Landmark at a model index.
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    /// Yaw in degrees, 0 when not estimated.
    pub fn yaw(&self) -> f64 {
        self.rotation.and_then(|r| r.yaw).unwrap_or(0.0)
    }

    /// Roll in degrees, 0 when not estimated.
    pub fn roll(&self) -> f64 {
        self.rotation.and_then(|r| r.roll).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_distance_is_symmetric() {
        let upper = Landmark::new(10.0, 100.0);
        let lower = Landmark::new(12.0, 110.0);
        assert_eq!(upper.vertical_distance(&lower), 10.0);
        assert_eq!(lower.vertical_distance(&upper), 10.0);
    }

    #[test]
    fn test_missing_rotation_defaults_to_zero() {
        let face = FaceSample::new(vec![Landmark::new(0.0, 0.0)]);
        assert_eq!(face.yaw(), 0.0);
        assert_eq!(face.roll(), 0.0);

        let turned = face.with_rotation(HeadRotation::new(-15.0, 4.0));
        assert_eq!(turned.yaw(), -15.0);
        assert_eq!(turned.roll(), 4.0);
    }

    #[test]
    fn test_landmark_lookup_out_of_range() {
        let face = FaceSample::new(vec![Landmark::with_depth(1.0, 2.0, 3.0)]);
        assert!(face.landmark(0).is_some());
        assert!(face.landmark(159).is_none());
    }
}
