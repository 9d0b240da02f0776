//! Attention detection pipeline.
//!
//! This crate provides:
//! - Camera permission and stream lifecycle over an injected media host
//! - Landmark estimation over an injected face model
//! - Eye-openness and head-pose attentiveness scoring
//! - A refresh-paced detection loop publishing `AttentionState` snapshots
//! - Attention-gated playback with a bounded grace queue

pub mod attention_queue;
pub mod capture;
pub mod config;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod playback;
pub mod scorer;
pub mod store;
pub mod ticker;
pub mod tracker;

pub use attention_queue::AttentionQueue;
pub use capture::{CaptureSessionManager, MediaDevices, MediaStream, CAMERA_PERMISSION};
pub use config::{
    CaptureConfig, EstimatorConfig, LoopConfig, PipelineConfig, PlaybackConfig, ScoringConfig,
    ScoringPolicy,
};
pub use error::{BoundaryError, EnvironmentError, SessionError, SessionResult};
pub use estimator::{LandmarkEstimator, LandmarkModel, ModelLoader};
pub use playback::{GateDecision, MediaPlayer, PlaybackGate};
pub use scorer::{AttentivenessScorer, EyeReading, ScoreBreakdown};
pub use store::AttentionStore;
pub use ticker::{IntervalTicker, RefreshTicker, TickerFactory};
pub use tracker::{AttentionTracker, LoopPhase};
