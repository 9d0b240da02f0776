//! Error types for capture sessions and detection.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Failure reported by an external collaborator (camera host, model runtime).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BoundaryError {
    pub message: String,
}

impl BoundaryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The host cannot capture at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("Camera access requires HTTPS. Please use a secure connection.")]
    InsecureContext,

    #[error("Your browser does not support camera access.")]
    Unsupported,
}

/// Errors that can occur while running an attention session.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Insecure context or missing capture capability. Not retryable here.
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// The viewer refused camera access.
    #[error("Camera permission was denied. Please reset permissions and reload.")]
    Permission,

    /// Stream or model initialization failed.
    #[error("{0}")]
    Setup(String),

    /// A single sampling iteration failed; the loop absorbs it.
    #[error("Detection failed: {0}")]
    TransientDetection(String),

    #[error("A capture session is already running")]
    AlreadyRunning,
}

impl SessionError {
    /// Create a setup failure error.
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup(message.into())
    }

    /// Create a per-tick detection failure error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientDetection(message.into())
    }

    /// Whether this error ends the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::TransientDetection(_) | Self::AlreadyRunning)
    }

    /// Short label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Environment(EnvironmentError::InsecureContext) => "insecure_context",
            Self::Environment(EnvironmentError::Unsupported) => "unsupported",
            Self::Permission => "permission_denied",
            Self::Setup(_) => "setup",
            Self::TransientDetection(_) => "detection",
            Self::AlreadyRunning => "already_running",
        }
    }

    /// Remediation a consumer can show next to `last_error`.
    pub fn remediation_hint(&self) -> Option<&'static str> {
        match self {
            Self::Environment(EnvironmentError::InsecureContext) => {
                Some("Use HTTPS instead of HTTP, or use localhost for development")
            }
            Self::Permission => Some("Reset the camera permission for this site and reload"),
            _ => None,
        }
    }
}

/// Await a setup step, failing with `SessionError::Setup` once `limit` elapses.
///
/// `None` waits indefinitely.
pub(crate) async fn within<F>(limit: Option<Duration>, step: &str, fut: F) -> SessionResult<F::Output>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            SessionError::setup(format!(
                "Timed out after {} ms while {}",
                limit.as_millis(),
                step
            ))
        }),
        None => Ok(fut.await),
    }
}
