//! Landmark estimator adapter.
//!
//! Boundary to the external face-landmark model. Model loading happens once
//! per session; after that `estimate` is called once per tick.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, warn};
use watchful_models::{FaceSample, VideoFrame};

use crate::config::EstimatorConfig;
use crate::error::{BoundaryError, SessionError, SessionResult};
use crate::metrics;

/// A loaded face-landmark model.
#[async_trait]
pub trait LandmarkModel: Send + Sync {
    /// Detect faces in a frame. An empty vector means no face is present.
    async fn estimate_faces(&self, frame: &VideoFrame) -> Result<Vec<FaceSample>, BoundaryError>;
}

/// Loads (fetches, compiles, warms up) a landmark model.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, config: &EstimatorConfig) -> Result<Box<dyn LandmarkModel>, BoundaryError>;
}

/// Initialized model plus the per-frame face limit.
pub struct LandmarkEstimator {
    model: Box<dyn LandmarkModel>,
    max_faces: usize,
}

impl LandmarkEstimator {
    /// Load the model. Failure is fatal to the session.
    pub async fn initialize(
        loader: &dyn ModelLoader,
        config: &EstimatorConfig,
    ) -> SessionResult<Self> {
        let started = Instant::now();
        let model = loader.load(config).await.map_err(|e| {
            warn!(error = %e, "Landmark model failed to load");
            SessionError::setup(e.message)
        })?;

        info!(
            max_faces = config.max_faces,
            refine_landmarks = config.refine_landmarks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Landmark model loaded"
        );

        Ok(Self::from_model(model, config.max_faces))
    }

    /// Wrap an already loaded model.
    pub fn from_model(model: Box<dyn LandmarkModel>, max_faces: usize) -> Self {
        Self {
            model,
            max_faces: max_faces.max(1),
        }
    }

    pub fn max_faces(&self) -> usize {
        self.max_faces
    }

    /// Estimate landmarks for one frame, keeping at most `max_faces` faces.
    pub async fn estimate(&self, frame: &VideoFrame) -> SessionResult<Vec<FaceSample>> {
        let started = Instant::now();
        let result = self.model.estimate_faces(frame).await;
        metrics::record_estimation_latency(started.elapsed().as_secs_f64() * 1000.0);

        let mut faces = result.map_err(|e| SessionError::transient(e.message))?;
        if faces.len() > self.max_faces {
            debug!(
                detected = faces.len(),
                kept = self.max_faces,
                "Ignoring extra faces"
            );
            faces.truncate(self.max_faces);
        }
        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use watchful_models::Landmark;

    struct CrowdModel {
        faces: usize,
    }

    #[async_trait]
    impl LandmarkModel for CrowdModel {
        async fn estimate_faces(&self, _frame: &VideoFrame) -> Result<Vec<FaceSample>, BoundaryError> {
            Ok((0..self.faces)
                .map(|i| FaceSample::new(vec![Landmark::new(i as f64, 0.0)]))
                .collect())
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl LandmarkModel for BrokenModel {
        async fn estimate_faces(&self, _frame: &VideoFrame) -> Result<Vec<FaceSample>, BoundaryError> {
            Err(BoundaryError::new("webgl context lost"))
        }
    }

    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ModelLoader for CountingLoader {
        async fn load(&self, config: &EstimatorConfig) -> Result<Box<dyn LandmarkModel>, BoundaryError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            assert!(config.refine_landmarks);
            if self.fail {
                Err(BoundaryError::new("model fetch failed"))
            } else {
                Ok(Box::new(CrowdModel { faces: 0 }))
            }
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::empty(1, 640, 480)
    }

    #[tokio::test]
    async fn test_extra_faces_are_truncated() {
        let estimator = LandmarkEstimator::from_model(Box::new(CrowdModel { faces: 3 }), 1);
        let faces = estimator.estimate(&frame()).await.unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].landmarks[0].x, 0.0);
    }

    #[tokio::test]
    async fn test_no_face_is_success() {
        let estimator = LandmarkEstimator::from_model(Box::new(CrowdModel { faces: 0 }), 1);
        assert!(estimator.estimate(&frame()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_transient() {
        let estimator = LandmarkEstimator::from_model(Box::new(BrokenModel), 1);
        let err = estimator.estimate(&frame()).await.unwrap_err();
        assert!(matches!(err, SessionError::TransientDetection(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_load_failure_is_setup_error() {
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = CountingLoader {
            loads: loads.clone(),
            fail: true,
        };
        let err = LandmarkEstimator::initialize(&loader, &EstimatorConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SessionError::Setup(ref m) if m == "model fetch failed"));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_max_faces_still_keeps_one() {
        let loader = CountingLoader {
            loads: Arc::new(AtomicUsize::new(0)),
            fail: false,
        };
        let config = EstimatorConfig {
            max_faces: 0,
            ..Default::default()
        };
        let estimator = LandmarkEstimator::initialize(&loader, &config).await.unwrap();
        assert_eq!(estimator.max_faces(), 1);
    }
}
