//! Test doubles for the capture host, the landmark model, and the refresh clock.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use watchful_models::{
    AttentionState, FaceSample, HeadRotation, Landmark, MediaConstraints, Origin,
    PermissionStatus, VideoFrame,
};
use watchful_pipeline::{
    BoundaryError, EstimatorConfig, LandmarkModel, MediaDevices, MediaStream, ModelLoader,
    PipelineConfig, RefreshTicker, TickerFactory,
};

/// Config with no settle delay so sessions start instantly.
pub fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.capture.settle_delay_ms = 0;
    config
}

// ============================================================================
// Capture host
// ============================================================================

pub struct FakeStream {
    live_tracks: AtomicUsize,
    stop_calls: AtomicUsize,
    sequence: AtomicU64,
    fail_ready: bool,
    has_frames: AtomicBool,
}

impl FakeStream {
    pub fn new() -> Self {
        Self {
            live_tracks: AtomicUsize::new(1),
            stop_calls: AtomicUsize::new(0),
            sequence: AtomicU64::new(0),
            fail_ready: false,
            has_frames: AtomicBool::new(true),
        }
    }

    pub fn failing_metadata() -> Self {
        Self {
            fail_ready: true,
            ..Self::new()
        }
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn set_has_frames(&self, has_frames: bool) {
        self.has_frames.store(has_frames, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStream for FakeStream {
    async fn wait_until_ready(&self) -> Result<(), BoundaryError> {
        if self.fail_ready {
            Err(BoundaryError::new("Video metadata never loaded"))
        } else {
            Ok(())
        }
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.has_frames.load(Ordering::SeqCst) {
            return None;
        }
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        Some(VideoFrame::empty(sequence, 640, 480))
    }

    fn stop_tracks(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.live_tracks.store(0, Ordering::SeqCst);
    }

    fn live_track_count(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }
}

pub struct FakeDevices {
    origin: Origin,
    supported: bool,
    permission: PermissionStatus,
    permission_error: Option<String>,
    request_error: Option<String>,
    stream: Arc<FakeStream>,
    permission_queries: AtomicUsize,
    media_requests: AtomicUsize,
    last_constraints: Mutex<Option<MediaConstraints>>,
}

impl FakeDevices {
    pub fn new(permission: PermissionStatus) -> Self {
        Self {
            origin: Origin::new("https:", "watch.example.com"),
            supported: true,
            permission,
            permission_error: None,
            request_error: None,
            stream: Arc::new(FakeStream::new()),
            permission_queries: AtomicUsize::new(0),
            media_requests: AtomicUsize::new(0),
            last_constraints: Mutex::new(None),
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn without_support(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn with_stream(mut self, stream: FakeStream) -> Self {
        self.stream = Arc::new(stream);
        self
    }

    pub fn failing_permission_query(mut self, message: &str) -> Self {
        self.permission_error = Some(message.to_string());
        self
    }

    pub fn failing_request(mut self, message: &str) -> Self {
        self.request_error = Some(message.to_string());
        self
    }

    pub fn stream(&self) -> Arc<FakeStream> {
        self.stream.clone()
    }

    pub fn permission_queries(&self) -> usize {
        self.permission_queries.load(Ordering::SeqCst)
    }

    pub fn media_requests(&self) -> usize {
        self.media_requests.load(Ordering::SeqCst)
    }

    pub fn last_constraints(&self) -> Option<MediaConstraints> {
        *self.last_constraints.lock().unwrap()
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    fn origin(&self) -> Origin {
        self.origin.clone()
    }

    fn has_capture_support(&self) -> bool {
        self.supported
    }

    async fn query_permission(&self, name: &str) -> Result<PermissionStatus, BoundaryError> {
        assert_eq!(name, "camera");
        self.permission_queries.fetch_add(1, Ordering::SeqCst);
        match &self.permission_error {
            Some(message) => Err(BoundaryError::new(message.clone())),
            None => Ok(self.permission),
        }
    }

    async fn request_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, BoundaryError> {
        self.media_requests.fetch_add(1, Ordering::SeqCst);
        *self.last_constraints.lock().unwrap() = Some(*constraints);
        match &self.request_error {
            Some(message) => Err(BoundaryError::new(message.clone())),
            None => Ok(self.stream.clone()),
        }
    }
}

// ============================================================================
// Landmark model
// ============================================================================

type Script = Arc<Mutex<VecDeque<Result<Vec<FaceSample>, String>>>>;

/// Model that replays queued results, then reports no face.
pub struct ScriptedModel {
    script: Script,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LandmarkModel for ScriptedModel {
    async fn estimate_faces(&self, _frame: &VideoFrame) -> Result<Vec<FaceSample>, BoundaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(faces)) => Ok(faces),
            Some(Err(message)) => Err(BoundaryError::new(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct ScriptedLoader {
    script: Script,
    calls: Arc<AtomicUsize>,
    loads: AtomicUsize,
    load_error: Option<String>,
    hang: bool,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            load_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Loader whose load never completes.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn push_faces(&self, faces: Vec<FaceSample>) {
        self.script.lock().unwrap().push_back(Ok(faces));
    }

    pub fn push_error(&self, message: &str) {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn estimate_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for ScriptedLoader {
    async fn load(&self, _config: &EstimatorConfig) -> Result<Box<dyn LandmarkModel>, BoundaryError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(message) = &self.load_error {
            return Err(BoundaryError::new(message.clone()));
        }
        Ok(Box::new(ScriptedModel {
            script: self.script.clone(),
            calls: self.calls.clone(),
        }))
    }
}

/// A face with both lids `gap` units apart and the given head pose.
pub fn face(gap: f64, yaw: f64, roll: f64) -> FaceSample {
    let mut landmarks = vec![Landmark::new(0.0, 0.0); 478];
    landmarks[159] = Landmark::new(120.0, 200.0);
    landmarks[145] = Landmark::new(120.0, 200.0 + gap);
    landmarks[386] = Landmark::new(220.0, 200.0);
    landmarks[374] = Landmark::new(220.0, 200.0 + gap);
    FaceSample::new(landmarks).with_rotation(HeadRotation::new(yaw, roll))
}

// ============================================================================
// Refresh clock
// ============================================================================

/// Ticker released one tick at a time by the test.
pub struct ManualTicker {
    ticks: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<()>>>,
}

#[async_trait]
impl RefreshTicker for ManualTicker {
    async fn next_tick(&mut self) {
        let received = self.ticks.lock().await.recv().await;
        if received.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

/// Build a ticker factory plus the handle that releases ticks.
pub fn manual_ticker() -> (TickerFactory, mpsc::UnboundedSender<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let ticks = Arc::new(tokio::sync::Mutex::new(rx));
    let factory: TickerFactory = Arc::new(move || {
        Box::new(ManualTicker {
            ticks: ticks.clone(),
        }) as Box<dyn RefreshTicker>
    });
    (factory, tx)
}

/// Release one tick and wait for the state it publishes.
pub async fn tick(
    ticks: &mpsc::UnboundedSender<()>,
    updates: &mut watch::Receiver<AttentionState>,
) -> AttentionState {
    updates.borrow_and_update();
    ticks.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("tick was not published")
        .unwrap();
    updates.borrow_and_update().clone()
}
