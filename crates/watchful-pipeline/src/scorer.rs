//! Attentiveness scoring from facial landmarks.
//!
//! Pure functions: identical landmark input always yields the same reading.
//!
//! # Landmarks used (MediaPipe face mesh)
//!
//! - 159 / 145: left eye upper / lower lid
//! - 386 / 374: right eye upper / lower lid
//!
//! # Weighted policy
//!
//! ```text
//! norm_yaw  = clamp(1 - |yaw| / 30, 0, 1)
//! norm_tilt = clamp(1 - |roll| / 20, 0, 1)
//! score     = clamp(60 + (eyes*0.5 + norm_yaw*0.3 + norm_tilt*0.2) * 40, 0, 100)
//! ```

use tracing::debug;
use watchful_models::{EyeStatus, FaceReading, FaceSample};

use crate::config::{ScoringConfig, ScoringPolicy};

pub const LEFT_EYE_UPPER: usize = 159;
pub const LEFT_EYE_LOWER: usize = 145;
pub const RIGHT_EYE_UPPER: usize = 386;
pub const RIGHT_EYE_LOWER: usize = 374;

/// Per-eye openness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeReading {
    pub left_open: bool,
    pub right_open: bool,
}

impl EyeReading {
    pub fn both_open(&self) -> bool {
        self.left_open && self.right_open
    }

    pub fn status(&self) -> EyeStatus {
        if self.both_open() {
            EyeStatus::Open
        } else {
            EyeStatus::Closed
        }
    }
}

/// Whether the lid gap between two landmarks exceeds the threshold.
///
/// Missing landmarks count as a closed eye.
pub fn eye_is_open(
    face: &FaceSample,
    upper: usize,
    lower: usize,
    threshold: f64,
) -> bool {
    match (face.landmark(upper), face.landmark(lower)) {
        (Some(upper), Some(lower)) => upper.vertical_distance(lower) > threshold,
        _ => false,
    }
}

/// Test both eyes of a face.
pub fn read_eyes(face: &FaceSample, threshold: f64) -> EyeReading {
    EyeReading {
        left_open: eye_is_open(face, LEFT_EYE_UPPER, LEFT_EYE_LOWER, threshold),
        right_open: eye_is_open(face, RIGHT_EYE_UPPER, RIGHT_EYE_LOWER, threshold),
    }
}

/// Map a rotation angle to [0, 1]: 1 facing the camera, 0 at or past `limit`.
///
/// Non-finite angles map to 0.
pub fn normalize_rotation(degrees: f64, limit: f64) -> f64 {
    if !degrees.is_finite() || limit.is_nan() || limit <= 0.0 {
        return 0.0;
    }
    (1.0 - degrees.abs() / limit).clamp(0.0, 1.0)
}

/// Contribution of each term to a weighted score, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub eyes_open: bool,
    pub norm_yaw: f64,
    pub norm_tilt: f64,
    pub base_points: f64,
    pub eye_points: f64,
    pub yaw_points: f64,
    pub tilt_points: f64,
    /// Clamped, unrounded score
    pub total: f64,
}

/// Turns face samples into published readings.
#[derive(Debug, Clone, Default)]
pub struct AttentivenessScorer {
    config: ScoringConfig,
}

impl AttentivenessScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score the first face of a frame sample. No face yields `None`.
    pub fn assess(&self, faces: &[FaceSample]) -> Option<FaceReading> {
        faces.first().map(|face| self.assess_face(face))
    }

    /// Score a single detected face.
    pub fn assess_face(&self, face: &FaceSample) -> FaceReading {
        let eyes = read_eyes(face, self.config.eye_open_threshold);

        let score = match self.config.policy {
            ScoringPolicy::Weighted => {
                let breakdown = self.breakdown(eyes.both_open(), face.yaw(), face.roll());
                debug!(
                    eyes_open = breakdown.eyes_open,
                    yaw = face.yaw(),
                    roll = face.roll(),
                    norm_yaw = breakdown.norm_yaw,
                    norm_tilt = breakdown.norm_tilt,
                    eye_points = breakdown.eye_points,
                    yaw_points = breakdown.yaw_points,
                    tilt_points = breakdown.tilt_points,
                    total = breakdown.total,
                    "Scored face"
                );
                breakdown.total
            }
            ScoringPolicy::TwoLevel => {
                if eyes.both_open() {
                    100.0
                } else {
                    50.0
                }
            }
        };

        FaceReading::new(eyes.status(), round_score(score))
    }

    /// Weighted score terms for the given eye state and angles.
    pub fn breakdown(&self, eyes_open: bool, yaw: f64, roll: f64) -> ScoreBreakdown {
        let c = &self.config;
        let norm_yaw = normalize_rotation(yaw, c.max_yaw_degrees);
        let norm_tilt = normalize_rotation(roll, c.max_roll_degrees);
        let eye_term = if eyes_open { 1.0 } else { 0.0 };

        let eye_points = eye_term * c.eye_weight * c.weighted_span;
        let yaw_points = norm_yaw * c.yaw_weight * c.weighted_span;
        let tilt_points = norm_tilt * c.tilt_weight * c.weighted_span;
        let raw = c.base_score + eye_points + yaw_points + tilt_points;

        ScoreBreakdown {
            eyes_open,
            norm_yaw,
            norm_tilt,
            base_points: c.base_score,
            eye_points,
            yaw_points,
            tilt_points,
            total: if raw.is_finite() { raw.clamp(0.0, 100.0) } else { 0.0 },
        }
    }
}

fn round_score(score: f64) -> u8 {
    if score.is_finite() {
        score.clamp(0.0, 100.0).round() as u8
    } else {
        0
    }
}
