//! Pipeline metrics.
//!
//! Standardized metrics for monitoring attention sessions:
//! - Session starts by outcome
//! - Detection ticks by outcome
//! - Estimation latency

use metrics::{counter, gauge, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Session start attempts by outcome (`started` or an error kind).
    pub const SESSION_STARTS_TOTAL: &str = "watchful_session_starts_total";

    /// Detection loop ticks by outcome (`face`, `no_face`, `error`).
    pub const TICKS_TOTAL: &str = "watchful_detection_ticks_total";

    /// Landmark estimation latency in seconds.
    pub const ESTIMATION_SECONDS: &str = "watchful_estimation_seconds";

    /// Most recently published attentiveness score.
    pub const ATTENTIVENESS: &str = "watchful_attentiveness";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record the outcome of a `start_session` call.
pub fn record_session_start(outcome: &'static str) {
    counter!(names::SESSION_STARTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record one detection tick.
pub fn record_tick(outcome: &'static str) {
    counter!(names::TICKS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record how long one estimation call took.
pub fn record_estimation_latency(latency_ms: f64) {
    histogram!(names::ESTIMATION_SECONDS).record(latency_ms / 1000.0);
}

/// Record the published attentiveness score.
pub fn set_attentiveness(score: u8) {
    gauge!(names::ATTENTIVENESS).set(score as f64);
}

// =============================================================================
// Tests
// =============================================================================
