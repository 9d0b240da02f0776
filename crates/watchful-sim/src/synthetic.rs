//! Synthetic camera host and viewer.
//!
//! The viewer cycles through scripted behaviours keyed on the frame
//! sequence number, with seeded jitter so runs are reproducible.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use watchful_models::{
    FaceSample, HeadRotation, Landmark, MediaConstraints, Origin, PermissionStatus, VideoFrame,
};
use watchful_pipeline::{
    BoundaryError, EstimatorConfig, LandmarkModel, MediaDevices, MediaStream, ModelLoader,
};

/// Landmarks in a refined face mesh.
const MESH_SIZE: usize = 478;

/// What the synthetic viewer is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Watching,
    Glancing,
    Drowsy,
    Away,
    Glitching,
}

impl Behaviour {
    const CYCLE: [Behaviour; 6] = [
        Behaviour::Watching,
        Behaviour::Glancing,
        Behaviour::Watching,
        Behaviour::Drowsy,
        Behaviour::Away,
        Behaviour::Glitching,
    ];

    /// Behaviour for a frame, holding each one for `frames_per_behaviour` frames.
    pub fn for_frame(sequence: u64, frames_per_behaviour: u64) -> Self {
        let slot = sequence / frames_per_behaviour.max(1);
        Self::CYCLE[(slot % Self::CYCLE.len() as u64) as usize]
    }
}

/// Camera host that always grants access.
pub struct SyntheticDevices {
    origin: Origin,
}

impl SyntheticDevices {
    pub fn new(origin: Origin) -> Self {
        Self { origin }
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    fn origin(&self) -> Origin {
        self.origin.clone()
    }

    fn has_capture_support(&self) -> bool {
        true
    }

    async fn query_permission(&self, _name: &str) -> Result<PermissionStatus, BoundaryError> {
        Ok(PermissionStatus::Prompt)
    }

    async fn request_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, BoundaryError> {
        info!(
            width = constraints.width,
            height = constraints.height,
            "Opening synthetic camera"
        );
        Ok(Arc::new(SyntheticStream::new(constraints.width, constraints.height)))
    }
}

/// Stream producing blank frames with increasing sequence numbers.
pub struct SyntheticStream {
    width: u32,
    height: u32,
    sequence: AtomicU64,
    live: AtomicBool,
}

impl SyntheticStream {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            sequence: AtomicU64::new(0),
            live: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl MediaStream for SyntheticStream {
    async fn wait_until_ready(&self) -> Result<(), BoundaryError> {
        Ok(())
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.live.load(Ordering::SeqCst) {
            return None;
        }
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        Some(VideoFrame::empty(sequence, self.width, self.height))
    }

    fn stop_tracks(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            debug!(frames = self.sequence.load(Ordering::SeqCst), "Synthetic camera stopped");
        }
    }

    fn live_track_count(&self) -> usize {
        usize::from(self.live.load(Ordering::SeqCst))
    }
}

/// Loader for the synthetic viewer model.
pub struct SyntheticLoader {
    seed: u64,
    frames_per_behaviour: u64,
}

impl SyntheticLoader {
    pub fn new(seed: u64, frames_per_behaviour: u64) -> Self {
        Self {
            seed,
            frames_per_behaviour,
        }
    }
}

#[async_trait]
impl ModelLoader for SyntheticLoader {
    async fn load(&self, config: &EstimatorConfig) -> Result<Box<dyn LandmarkModel>, BoundaryError> {
        info!(
            seed = self.seed,
            max_faces = config.max_faces,
            "Loading synthetic viewer model"
        );
        Ok(Box::new(SyntheticViewer {
            rng: Mutex::new(StdRng::seed_from_u64(self.seed)),
            frames_per_behaviour: self.frames_per_behaviour,
        }))
    }
}

/// Landmark model that reports a scripted viewer.
pub struct SyntheticViewer {
    rng: Mutex<StdRng>,
    frames_per_behaviour: u64,
}

#[async_trait]
impl LandmarkModel for SyntheticViewer {
    async fn estimate_faces(&self, frame: &VideoFrame) -> Result<Vec<FaceSample>, BoundaryError> {
        let behaviour = Behaviour::for_frame(frame.sequence, self.frames_per_behaviour);
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| BoundaryError::new("Synthetic viewer state poisoned"))?;

        let (gap, yaw, roll) = match behaviour {
            Behaviour::Away => return Ok(Vec::new()),
            Behaviour::Glitching if rng.random_bool(0.5) => {
                return Err(BoundaryError::new("Synthetic inference glitch"));
            }
            Behaviour::Watching | Behaviour::Glitching => (
                rng.random_range(9.0..12.0),
                rng.random_range(-4.0..4.0),
                rng.random_range(-3.0..3.0),
            ),
            Behaviour::Glancing => (
                rng.random_range(8.0..11.0),
                rng.random_range(20.0..40.0),
                rng.random_range(-8.0..8.0),
            ),
            Behaviour::Drowsy => (
                rng.random_range(1.0..4.0),
                rng.random_range(-6.0..6.0),
                rng.random_range(10.0..18.0),
            ),
        };

        Ok(vec![face(gap, yaw, roll)])
    }
}

/// Face mesh with both lids `gap` pixels apart.
fn face(gap: f64, yaw: f64, roll: f64) -> FaceSample {
    let mut landmarks = vec![Landmark::with_depth(320.0, 240.0, 0.0); MESH_SIZE];
    for (upper, lower, x) in [(159, 145, 280.0), (386, 374, 360.0)] {
        landmarks[upper] = Landmark::with_depth(x, 220.0, -4.0);
        landmarks[lower] = Landmark::with_depth(x, 220.0 + gap, -4.0);
    }
    FaceSample::new(landmarks).with_rotation(HeadRotation::new(yaw, roll))
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchful_pipeline::{AttentivenessScorer, ScoringConfig};

    #[test]
    fn test_behaviour_cycles() {
        assert_eq!(Behaviour::for_frame(0, 10), Behaviour::Watching);
        assert_eq!(Behaviour::for_frame(10, 10), Behaviour::Glancing);
        assert_eq!(Behaviour::for_frame(45, 10), Behaviour::Away);
        assert_eq!(Behaviour::for_frame(60, 10), Behaviour::Watching);
        assert_eq!(Behaviour::for_frame(3, 0), Behaviour::Drowsy);
    }

    #[tokio::test]
    async fn test_viewer_scores_follow_behaviour() {
        let loader = SyntheticLoader::new(7, 1);
        let model = loader.load(&EstimatorConfig::default()).await.unwrap();
        let scorer = AttentivenessScorer::new(ScoringConfig::default());

        let watching = model.estimate_faces(&VideoFrame::empty(0, 640, 480)).await.unwrap();
        let reading = scorer.assess(&watching).unwrap();
        assert!(reading.attentiveness >= 90);

        let drowsy = model.estimate_faces(&VideoFrame::empty(3, 640, 480)).await.unwrap();
        let reading = scorer.assess(&drowsy).unwrap();
        assert!(reading.attentiveness < 85);

        let away = model.estimate_faces(&VideoFrame::empty(4, 640, 480)).await.unwrap();
        assert!(scorer.assess(&away).is_none());
    }

    #[test]
    fn test_stream_stops_once() {
        let stream = SyntheticStream::new(640, 480);
        assert!(stream.current_frame().is_some());
        stream.stop_tracks();
        stream.stop_tracks();
        assert_eq!(stream.live_track_count(), 0);
        assert!(stream.current_frame().is_none());
    }
}
