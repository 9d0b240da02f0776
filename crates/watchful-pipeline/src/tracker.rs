//! Attention tracker: session lifecycle and the detection loop.
//!
//! # Phases
//!
//! ```text
//!  Idle ──start──▶ Initializing ──model ready──▶ Running ──stop──▶ Stopped
//!                      │                            │
//!                      └──── env / permission / setup failure ──▶ Error
//! ```
//!
//! While running, one tokio task samples the stream: wait for a refresh tick,
//! pull a frame, estimate landmarks, score, publish. Iterations never
//! overlap, so state writes are strictly ordered. Teardown signals the task
//! through a watch channel, waits for it to exit, then releases the stream.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use watchful_models::{FaceSample, PermissionStatus};

use crate::capture::{CaptureSessionManager, MediaDevices, MediaStream};
use crate::config::PipelineConfig;
use crate::error::{within, SessionError, SessionResult};
use crate::estimator::{LandmarkEstimator, ModelLoader};
use crate::metrics;
use crate::scorer::AttentivenessScorer;
use crate::store::AttentionStore;
use crate::ticker::{IntervalTicker, RefreshTicker, TickerFactory};

/// Detection loop phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    #[default]
    Idle,
    Initializing,
    Running,
    Stopped,
    Error,
}

impl LoopPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopPhase::Idle => "idle",
            LoopPhase::Initializing => "initializing",
            LoopPhase::Running => "running",
            LoopPhase::Stopped => "stopped",
            LoopPhase::Error => "error",
        }
    }
}

impl std::fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle to a spawned detection loop.
struct RunningLoop {
    session_id: Uuid,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns one capture-and-detect session at a time and publishes its state.
pub struct AttentionTracker {
    config: PipelineConfig,
    store: AttentionStore,
    capture: CaptureSessionManager,
    loader: Arc<dyn ModelLoader>,
    ticker_factory: TickerFactory,
    phase: LoopPhase,
    running: Option<RunningLoop>,
    permission_denied: bool,
}

impl AttentionTracker {
    /// Create a tracker that samples at the configured refresh rate.
    pub fn new(
        config: PipelineConfig,
        devices: Arc<dyn MediaDevices>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        let ticker_factory = IntervalTicker::factory(config.detection_loop.tick_period());
        Self::with_ticker(config, devices, loader, ticker_factory)
    }

    /// Create a tracker with a custom refresh source.
    pub fn with_ticker(
        config: PipelineConfig,
        devices: Arc<dyn MediaDevices>,
        loader: Arc<dyn ModelLoader>,
        ticker_factory: TickerFactory,
    ) -> Self {
        let store = AttentionStore::new();
        let capture = CaptureSessionManager::new(devices, config.capture.clone(), store.clone());
        Self {
            config,
            store,
            capture,
            loader,
            ticker_factory,
            phase: LoopPhase::Idle,
            running: None,
            permission_denied: false,
        }
    }

    /// Read handle to the published state.
    pub fn state(&self) -> AttentionStore {
        self.store.clone()
    }

    /// Live capture stream, for optional display.
    pub fn stream(&self) -> Option<Arc<dyn MediaStream>> {
        self.capture.stream()
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Identifier of the running session.
    pub fn session_id(&self) -> Option<Uuid> {
        self.running.as_ref().map(|r| r.session_id)
    }

    /// Acquire the camera, load the model, and start sampling.
    ///
    /// Each session starts from a fresh record: readings from an earlier
    /// session are cleared before setup begins.
    ///
    /// Environment, permission, and setup failures move the tracker to
    /// `LoopPhase::Error`, publish `last_error`, and release anything opened.
    /// A denied permission is remembered: later calls fail immediately
    /// without touching the camera host.
    pub async fn start_session(&mut self) -> SessionResult<()> {
        if self.running.is_some() {
            return Err(SessionError::AlreadyRunning);
        }

        if self.permission_denied {
            let err = SessionError::Permission;
            self.store.update(|s| {
                s.begin_session();
                s.set_permission(PermissionStatus::Denied);
                s.fail(err.to_string());
            });
            self.phase = LoopPhase::Error;
            metrics::record_session_start(err.kind());
            return Err(err);
        }

        let session_id = Uuid::new_v4();
        self.store.update(|s| s.begin_session());
        self.phase = LoopPhase::Initializing;
        info!(%session_id, "Starting attention session");

        let result = self.setup(session_id).await;
        match result {
            Ok(running) => {
                self.running = Some(running);
                self.phase = LoopPhase::Running;
                metrics::record_session_start("started");
                info!(%session_id, "Attention session running");
                Ok(())
            }
            Err(err) => {
                self.capture.stop();
                if matches!(err, SessionError::Permission) {
                    self.permission_denied = true;
                }
                self.store.update(|s| s.fail(err.to_string()));
                self.phase = LoopPhase::Error;
                metrics::record_session_start(err.kind());
                error!(%session_id, kind = err.kind(), "Attention session failed: {}", err);
                Err(err)
            }
        }
    }

    /// Cancel the pending tick, wait for the loop to exit, release the stream.
    ///
    /// Idempotent and safe to call when no session was ever started.
    ///
    /// The published record is left as the last tick wrote it, so
    /// `camera_status` may still read `ready` with a stale reading. Consumers
    /// gating on the state should check `phase()` or stop observing once the
    /// session is stopped.
    pub async fn stop_session(&mut self) {
        if let Some(running) = self.running.take() {
            // The loop may already have exited; a closed channel is fine.
            let _ = running.shutdown.send(true);
            if let Err(e) = running.handle.await {
                warn!(session_id = %running.session_id, "Detection loop ended abnormally: {}", e);
            }
            info!(session_id = %running.session_id, "Attention session stopped");
        }

        self.capture.stop();

        if matches!(self.phase, LoopPhase::Running | LoopPhase::Initializing) {
            self.phase = LoopPhase::Stopped;
        }
    }

    async fn setup(&mut self, session_id: Uuid) -> SessionResult<RunningLoop> {
        let stream = self.capture.start().await?;

        self.store
            .update(|s| s.set_status_line("Loading face landmarks model..."));
        let estimator = within(
            self.config.capture.setup_timeout(),
            "loading the landmark model",
            LandmarkEstimator::initialize(&*self.loader, &self.config.estimator),
        )
        .await??;

        self.store.update(|s| s.mark_ready());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let detection = DetectionLoop {
            session_id,
            stream,
            estimator,
            scorer: AttentivenessScorer::new(self.config.scoring.clone()),
            store: self.store.clone(),
            ticker: (self.ticker_factory)(),
            shutdown: shutdown_rx,
        };

        Ok(RunningLoop {
            session_id,
            shutdown: shutdown_tx,
            handle: tokio::spawn(detection.run()),
        })
    }
}

impl Drop for AttentionTracker {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(true);
            running.handle.abort();
        }
        self.capture.stop();
    }
}

/// The sampling task.
struct DetectionLoop {
    session_id: Uuid,
    stream: Arc<dyn MediaStream>,
    estimator: LandmarkEstimator,
    scorer: AttentivenessScorer,
    store: AttentionStore,
    ticker: Box<dyn RefreshTicker>,
    shutdown: watch::Receiver<bool>,
}

impl DetectionLoop {
    async fn run(self) {
        let DetectionLoop {
            session_id,
            stream,
            estimator,
            scorer,
            store,
            mut ticker,
            mut shutdown,
        } = self;

        let mut ticks: u64 = 0;
        debug!(%session_id, "Detection loop started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.next_tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                outcome = sample(stream.as_ref(), &estimator) => outcome,
            };

            ticks += 1;
            match outcome {
                Ok(faces) => {
                    let reading = scorer.assess(&faces);
                    store.update(|s| s.record_sample(reading, Utc::now()));
                    match reading {
                        Some(reading) => {
                            metrics::record_tick("face");
                            metrics::set_attentiveness(reading.attentiveness);
                        }
                        None => {
                            metrics::record_tick("no_face");
                            metrics::set_attentiveness(0);
                        }
                    }
                }
                Err(e) => {
                    debug!(%session_id, tick = ticks, "Detection tick failed: {}", e);
                    store.update(|s| s.record_detection_error());
                    metrics::record_tick("error");
                    metrics::set_attentiveness(0);
                }
            }
        }

        debug!(%session_id, ticks, "Detection loop exited");
    }
}

/// Pull the current frame and estimate landmarks for it.
async fn sample(
    stream: &dyn MediaStream,
    estimator: &LandmarkEstimator,
) -> SessionResult<Vec<FaceSample>> {
    let frame = stream
        .current_frame()
        .ok_or_else(|| SessionError::transient("No frame available"))?;
    estimator.estimate(&frame).await
}
