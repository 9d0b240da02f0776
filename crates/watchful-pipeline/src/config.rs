//! Configuration for the attention pipeline.
//!
//! Every section has a `Default` matching the stock web player, and
//! `PipelineConfig::from_env` overrides individual values from `WATCHFUL_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use watchful_models::{FacingMode, MediaConstraints};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub capture: CaptureConfig,
    pub estimator: EstimatorConfig,
    pub scoring: ScoringConfig,
    pub detection_loop: LoopConfig,
    pub playback: PlaybackConfig,
}

/// Camera acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Requested capture width (default: 640)
    pub width: u32,
    /// Requested capture height (default: 480)
    pub height: u32,
    /// Camera to request (default: user-facing)
    pub facing_mode: FacingMode,
    /// Delay after the stream reports ready, for devices whose first frames
    /// are unstable (default: 1000 ms)
    pub settle_delay_ms: u64,
    /// Upper bound for each setup step (permission query, stream request,
    /// metadata wait, model load). `None` waits indefinitely.
    pub setup_timeout_ms: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing_mode: FacingMode::User,
            settle_delay_ms: 1000,
            setup_timeout_ms: None,
        }
    }
}

impl CaptureConfig {
    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints::video(self.width, self.height, self.facing_mode)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn setup_timeout(&self) -> Option<Duration> {
        self.setup_timeout_ms.map(Duration::from_millis)
    }
}

/// Options passed to the landmark model loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Faces evaluated per frame (default: 1)
    pub max_faces: usize,
    /// Ask the model for refined eye/iris landmarks (default: true)
    pub refine_landmarks: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_faces: 1,
            refine_landmarks: true,
        }
    }
}

/// How a detected face is turned into an attentiveness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringPolicy {
    /// Base score plus weighted eye, yaw, and tilt terms
    #[default]
    Weighted,
    /// 100 with eyes open, 50 with eyes closed
    TwoLevel,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::Weighted => "weighted",
            ScoringPolicy::TwoLevel => "two_level",
        }
    }
}

impl std::fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weighted" => Ok(ScoringPolicy::Weighted),
            "two_level" | "twolevel" => Ok(ScoringPolicy::TwoLevel),
            other => Err(format!("unknown scoring policy: {}", other)),
        }
    }
}

/// Attentiveness scoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub policy: ScoringPolicy,
    /// Eyelid gap (model pixel units) above which an eye counts as open (default: 7.0)
    pub eye_open_threshold: f64,
    /// Score of any detected face before the weighted terms (default: 60.0)
    pub base_score: f64,
    /// Points distributed across the weighted terms (default: 40.0)
    pub weighted_span: f64,
    /// Weight of the eyes-open term (default: 0.5)
    pub eye_weight: f64,
    /// Weight of the normalized yaw term (default: 0.3)
    pub yaw_weight: f64,
    /// Weight of the normalized roll term (default: 0.2)
    pub tilt_weight: f64,
    /// Yaw at which the yaw term reaches zero, degrees (default: 30.0)
    pub max_yaw_degrees: f64,
    /// Roll at which the tilt term reaches zero, degrees (default: 20.0)
    pub max_roll_degrees: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::Weighted,
            eye_open_threshold: 7.0,
            base_score: 60.0,
            weighted_span: 40.0,
            eye_weight: 0.5,
            yaw_weight: 0.3,
            tilt_weight: 0.2,
            max_yaw_degrees: 30.0,
            max_roll_degrees: 20.0,
        }
    }
}

/// Detection loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Display refresh rate the loop is synchronized to (default: 60 Hz)
    pub refresh_hz: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self { refresh_hz: 60.0 }
    }
}

impl LoopConfig {
    /// Slowest accepted refresh rate.
    pub const MIN_REFRESH_HZ: f64 = 1.0;
    /// Fastest accepted refresh rate; keeps the tick period non-zero.
    pub const MAX_REFRESH_HZ: f64 = 1000.0;

    /// Time between refresh ticks, with the rate clamped to
    /// `MIN_REFRESH_HZ..=MAX_REFRESH_HZ`.
    pub fn tick_period(&self) -> Duration {
        let hz = if self.refresh_hz.is_finite() {
            self.refresh_hz.clamp(Self::MIN_REFRESH_HZ, Self::MAX_REFRESH_HZ)
        } else {
            60.0
        };
        Duration::from_secs_f64(1.0 / hz)
    }
}

/// Playback gating parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Minimum attentiveness for a sample to count as attentive (default: 85)
    pub min_attentiveness: u8,
    /// Attention queue limit; inattentive ticks tolerated before pausing (default: 30)
    pub queue_limit: u32,
    /// Scale volume with attentiveness while playing (default: true)
    pub volume_follows_attentiveness: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_attentiveness: 85,
            queue_limit: 30,
            volume_follows_attentiveness: true,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(threshold) = env_parse("WATCHFUL_EYE_THRESHOLD") {
            config.scoring.eye_open_threshold = threshold;
        }
        if let Some(policy) = env_parse("WATCHFUL_SCORING_POLICY") {
            config.scoring.policy = policy;
        }
        if let Some(delay) = env_parse("WATCHFUL_SETTLE_DELAY_MS") {
            config.capture.settle_delay_ms = delay;
        }
        if let Some(timeout) = env_parse("WATCHFUL_SETUP_TIMEOUT_MS") {
            config.capture.setup_timeout_ms = Some(timeout);
        }
        if let Some(hz) = env_parse("WATCHFUL_REFRESH_HZ") {
            config.detection_loop.refresh_hz = hz;
        }
        if let Some(min) = env_parse::<u8>("WATCHFUL_MIN_ATTENTIVENESS") {
            config.playback.min_attentiveness = min.min(100);
        }
        if let Some(limit) = env_parse("WATCHFUL_ATTENTION_QUEUE_LIMIT") {
            config.playback.queue_limit = limit;
        }

        config
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
