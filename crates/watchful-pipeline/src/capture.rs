//! Capture session management.
//!
//! Acquires camera permission and a live video stream through an injected
//! `MediaDevices` host, and owns the stream until it is released.
//!
//! # Startup sequence
//!
//! 1. Reject insecure origins and hosts without capture support
//! 2. Query the `camera` permission; stop if denied
//! 3. Request a video-only 640x480 user-facing stream
//! 4. Wait for ready metadata, then a settle delay

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use watchful_models::{MediaConstraints, Origin, PermissionStatus, VideoFrame};

use crate::config::CaptureConfig;
use crate::error::{within, BoundaryError, EnvironmentError, SessionError, SessionResult};
use crate::store::AttentionStore;

/// Permission name queried before requesting the camera.
pub const CAMERA_PERMISSION: &str = "camera";

/// Camera and permission host (a browser, a native camera stack, a test double).
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Origin of the page requesting capture.
    fn origin(&self) -> Origin;

    /// Whether permission and media APIs are available at all.
    fn has_capture_support(&self) -> bool;

    /// Current state of a named permission.
    async fn query_permission(&self, name: &str) -> Result<PermissionStatus, BoundaryError>;

    /// Open a live stream matching the constraints.
    async fn request_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, BoundaryError>;
}

/// A live capture stream.
#[async_trait]
pub trait MediaStream: Send + Sync {
    /// Resolve once the stream has reported its metadata.
    async fn wait_until_ready(&self) -> Result<(), BoundaryError>;

    /// Latest frame, if one is available.
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Stop every track. Must be safe to call repeatedly.
    fn stop_tracks(&self);

    /// Number of tracks still live.
    fn live_track_count(&self) -> usize;
}

/// Owns the permission check and the stream lifecycle.
pub struct CaptureSessionManager {
    devices: Arc<dyn MediaDevices>,
    config: CaptureConfig,
    store: AttentionStore,
    stream: Option<Arc<dyn MediaStream>>,
}

impl CaptureSessionManager {
    pub fn new(devices: Arc<dyn MediaDevices>, config: CaptureConfig, store: AttentionStore) -> Self {
        Self {
            devices,
            config,
            store,
            stream: None,
        }
    }

    /// Currently open stream, if any.
    pub fn stream(&self) -> Option<Arc<dyn MediaStream>> {
        self.stream.clone()
    }

    /// Check the environment and permission, then open and settle a stream.
    ///
    /// On any failure after the stream was opened, the stream is released
    /// before the error is returned.
    pub async fn start(&mut self) -> SessionResult<Arc<dyn MediaStream>> {
        self.check_environment()?;

        let permission = self.check_permission().await?;
        if permission == PermissionStatus::Denied {
            warn!("Camera permission denied");
            return Err(SessionError::Permission);
        }

        self.store.update(|s| s.begin_setup("Setting up camera..."));

        let timeout = self.config.setup_timeout();
        let constraints = self.config.constraints();
        debug!(?constraints, "Requesting camera stream");

        let stream = within(
            timeout,
            "requesting the camera stream",
            self.devices.request_user_media(&constraints),
        )
        .await?
        .map_err(|e| SessionError::setup(e.message))?;
        self.stream = Some(stream.clone());

        // A stream was granted, so a prompt has been accepted.
        if permission == PermissionStatus::Prompt {
            self.store.update(|s| s.set_permission(PermissionStatus::Granted));
        }

        let settled = self.settle(&stream).await;
        if let Err(e) = settled {
            self.stop();
            return Err(e);
        }

        info!(
            width = constraints.width,
            height = constraints.height,
            "Camera stream ready"
        );
        Ok(stream)
    }

    /// Release every track of the stream. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop_tracks();
            info!("Camera stream released");
        }
    }

    fn check_environment(&self) -> SessionResult<()> {
        let origin = self.devices.origin();
        if !origin.is_secure() {
            warn!(
                protocol = %origin.protocol,
                hostname = %origin.hostname,
                "Refusing camera access from insecure origin"
            );
            return Err(EnvironmentError::InsecureContext.into());
        }

        if !self.devices.has_capture_support() {
            warn!("Host has no permission or media capture support");
            return Err(EnvironmentError::Unsupported.into());
        }

        Ok(())
    }

    async fn check_permission(&self) -> SessionResult<PermissionStatus> {
        let permission = within(
            self.config.setup_timeout(),
            "checking camera permissions",
            self.devices.query_permission(CAMERA_PERMISSION),
        )
        .await?
        .map_err(|e| {
            warn!(error = %e, "Permission query failed");
            SessionError::setup("Failed to check camera permissions")
        })?;

        debug!(%permission, "Camera permission state");
        self.store.update(|s| s.set_permission(permission));
        Ok(permission)
    }

    async fn settle(&self, stream: &Arc<dyn MediaStream>) -> SessionResult<()> {
        within(
            self.config.setup_timeout(),
            "waiting for camera metadata",
            stream.wait_until_ready(),
        )
        .await?
        .map_err(|e| SessionError::setup(e.message))?;

        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Waiting for camera to settle");
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

impl Drop for CaptureSessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}
