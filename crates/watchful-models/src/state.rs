//! Attention state record.
//!
//! `AttentionState` is the single record the pipeline publishes. Every
//! mutation goes through one of the transition methods below so the
//! record never leaves its invariants:
//! - not watching implies `EyeStatus::Unknown` and zero attentiveness
//! - `CameraStatus::Error` implies not watching
//! - attentiveness stays within 0-100

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status line shown before any session has started.
pub const STATUS_NOT_STARTED: &str = "Not started";
/// Status line published when a sample contains no face.
pub const STATUS_NO_FACE: &str = "No face detected";
/// Status line published when a sample's estimation failed.
pub const STATUS_DETECTION_ERROR: &str = "Detection error occurred";

/// Camera lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    /// Permission, stream, or model setup in progress
    #[default]
    Initializing,
    /// Stream is live and the detection loop is sampling
    Ready,
    /// Setup failed; see `last_error`
    Error,
}

impl CameraStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraStatus::Initializing => "initializing",
            CameraStatus::Ready => "ready",
            CameraStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Camera permission state as reported by the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// The user has not decided yet; requesting media will prompt
    #[default]
    Prompt,
    /// Camera access allowed
    Granted,
    /// Camera access refused
    Denied,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Prompt => "prompt",
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
        }
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Eye state of the tracked face.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum EyeStatus {
    Open,
    Closed,
    /// No face present
    #[default]
    Unknown,
}

impl EyeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EyeStatus::Open => "open",
            EyeStatus::Closed => "closed",
            EyeStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EyeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scored reading for a frame that contained a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FaceReading {
    /// Open or closed; never `Unknown` for a detected face
    pub eye_status: EyeStatus,
    /// Rounded attentiveness score (0-100)
    pub attentiveness: u8,
}

impl FaceReading {
    pub fn new(eye_status: EyeStatus, attentiveness: u8) -> Self {
        Self {
            eye_status,
            attentiveness: attentiveness.min(100),
        }
    }
}

/// Snapshot of camera, permission, and detection status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AttentionState {
    /// Camera lifecycle status
    pub camera_status: CameraStatus,
    /// Camera permission state
    pub permission_status: PermissionStatus,
    /// True iff the most recent sample contained a face
    pub is_watching: bool,
    /// Eye state of the tracked face
    pub eye_status: EyeStatus,
    /// Attentiveness score (0-100)
    pub attentiveness: u8,
    /// When the most recent successful sample was taken
    pub last_detection_time: Option<DateTime<Utc>>,
    /// Human-readable diagnostic for the last setup failure
    pub last_error: Option<String>,
    /// Free-text status line for diagnostics
    pub face_detection_status: String,
}

impl Default for AttentionState {
    fn default() -> Self {
        Self {
            camera_status: CameraStatus::Initializing,
            permission_status: PermissionStatus::Prompt,
            is_watching: false,
            eye_status: EyeStatus::Unknown,
            attentiveness: 0,
            last_detection_time: None,
            last_error: None,
            face_detection_status: STATUS_NOT_STARTED.to_string(),
        }
    }
}

impl AttentionState {
    /// Create the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the permission state reported by the host.
    pub fn set_permission(&mut self, permission: PermissionStatus) {
        self.permission_status = permission;
    }

    /// Replace the diagnostic status line.
    pub fn set_status_line(&mut self, status: impl Into<String>) {
        self.face_detection_status = status.into();
    }

    /// Start a new capture session with a fresh record.
    ///
    /// Only the permission state carries over; readings, errors, and the
    /// detection time of an earlier session are discarded.
    pub fn begin_session(&mut self) {
        *self = Self {
            permission_status: self.permission_status,
            ..Self::default()
        };
    }

    /// Enter camera/model setup.
    pub fn begin_setup(&mut self, status: impl Into<String>) {
        self.camera_status = CameraStatus::Initializing;
        self.face_detection_status = status.into();
    }

    /// Setup finished; clears any previous error.
    pub fn mark_ready(&mut self) {
        self.camera_status = CameraStatus::Ready;
        self.last_error = None;
        self.face_detection_status = "Starting face detection...".to_string();
    }

    /// Setup failed; the session halts.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.camera_status = CameraStatus::Error;
        self.last_error = Some(error.into());
        self.clear_face();
    }

    /// Record a successful sample. `None` means no face was present.
    ///
    /// Ignored while the camera is in the error state.
    pub fn record_sample(&mut self, reading: Option<FaceReading>, at: DateTime<Utc>) {
        if self.camera_status == CameraStatus::Error {
            return;
        }
        self.last_detection_time = Some(at);
        match reading {
            Some(reading) => {
                let attentiveness = reading.attentiveness.min(100);
                self.is_watching = true;
                self.eye_status = match reading.eye_status {
                    EyeStatus::Unknown => EyeStatus::Closed,
                    status => status,
                };
                self.attentiveness = attentiveness;
                self.face_detection_status = format!("Attentiveness: {}%", attentiveness);
            }
            None => {
                self.clear_face();
                self.face_detection_status = STATUS_NO_FACE.to_string();
            }
        }
    }

    /// Record a sample whose estimation failed. The tick counts as "no face".
    pub fn record_detection_error(&mut self) {
        self.clear_face();
        self.face_detection_status = STATUS_DETECTION_ERROR.to_string();
    }

    /// Check the record's invariants.
    pub fn is_consistent(&self) -> bool {
        let absent_face_cleared =
            self.is_watching || (self.eye_status == EyeStatus::Unknown && self.attentiveness == 0);
        let error_not_watching = self.camera_status != CameraStatus::Error || !self.is_watching;
        let present_face_known = !self.is_watching || self.eye_status != EyeStatus::Unknown;

        absent_face_cleared && error_not_watching && present_face_known && self.attentiveness <= 100
    }

    fn clear_face(&mut self) {
        self.is_watching = false;
        self.eye_status = EyeStatus::Unknown;
        self.attentiveness = 0;
    }
}
