//! Shared data models for the Watchful attention pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - The attention state record published to consumers
//! - Facial landmarks and face samples produced by landmark models
//! - Capture constraints, frames, and page origins
//! - Display coverage of the player surface

pub mod coverage;
pub mod landmark;
pub mod media;
pub mod state;

// Re-export common types
pub use coverage::{display_coverage, SurfaceSize};
pub use landmark::{FaceSample, HeadRotation, Landmark};
pub use media::{FacingMode, MediaConstraints, Origin, OriginError, VideoFrame};
pub use state::{AttentionState, CameraStatus, EyeStatus, FaceReading, PermissionStatus};
