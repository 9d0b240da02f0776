//! Attention-gated playback.
//!
//! `PlaybackGate` reads attention snapshots and drives a player: attentive
//! samples keep it playing and refill the attention queue, inattentive ones
//! spend queued credit and pause once it runs out. A camera error pauses
//! immediately.

use tokio::sync::watch;
use tracing::{debug, info};
use watchful_models::{AttentionState, CameraStatus};

use crate::attention_queue::AttentionQueue;
use crate::config::PlaybackConfig;

/// Any player that can start, stop, and change volume.
#[cfg_attr(test, mockall::automock)]
pub trait MediaPlayer: Send {
    fn play(&mut self);
    fn pause(&mut self);
    /// Volume in [0.0, 1.0].
    fn set_volume(&mut self, volume: f64);
}

/// What the gate did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Viewer is attentive; playing
    Playing,
    /// Viewer looked away; still playing on queued credit
    Grace,
    /// Paused
    Paused,
}

/// Drives a `MediaPlayer` from attention snapshots.
pub struct PlaybackGate<P: MediaPlayer> {
    player: P,
    config: PlaybackConfig,
    queue: AttentionQueue,
    playing: bool,
    volume: Option<f64>,
}

impl<P: MediaPlayer> PlaybackGate<P> {
    /// Create a gate. The player is assumed to start paused.
    pub fn new(player: P, config: PlaybackConfig) -> Self {
        let queue = AttentionQueue::new(config.queue_limit);
        Self {
            player,
            config,
            queue,
            playing: false,
            volume: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn queued_attention(&self) -> u32 {
        self.queue.len()
    }

    /// Whether a snapshot counts as attentive viewing.
    pub fn is_attentive(&self, state: &AttentionState) -> bool {
        state.is_watching && state.attentiveness >= self.config.min_attentiveness
    }

    /// React to one snapshot.
    pub fn observe(&mut self, state: &AttentionState) -> GateDecision {
        if state.camera_status == CameraStatus::Error {
            self.queue.drain();
            self.pause();
            return GateDecision::Paused;
        }

        if self.is_attentive(state) {
            self.queue.enqueue();
            self.play();
            if self.config.volume_follows_attentiveness {
                self.set_volume(f64::from(state.attentiveness) / 100.0);
            }
            return GateDecision::Playing;
        }

        if self.playing && self.queue.consume() {
            debug!(remaining = self.queue.len(), "Viewer inattentive, playing on queued attention");
            return GateDecision::Grace;
        }

        self.pause();
        GateDecision::Paused
    }

    /// Follow a store subscription until the store is dropped, then pause
    /// and hand the player back.
    ///
    /// The watch channel keeps only the latest snapshot, so intermediate
    /// ticks published faster than the gate runs are skipped.
    pub async fn run(mut self, mut updates: watch::Receiver<AttentionState>) -> P {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            self.observe(&snapshot);
            if updates.changed().await.is_err() {
                break;
            }
        }
        self.pause();
        self.player
    }

    /// Give the player back.
    pub fn into_player(self) -> P {
        self.player
    }

    fn play(&mut self) {
        if !self.playing {
            info!("Viewer attentive, resuming playback");
            self.player.play();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if self.playing {
            info!("Viewer not attentive, pausing playback");
            self.player.pause();
            self.playing = false;
        }
    }

    fn set_volume(&mut self, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        let changed = self
            .volume
            .map_or(true, |current| (current - volume).abs() > f64::EPSILON);
        if changed {
            self.player.set_volume(volume);
            self.volume = Some(volume);
        }
    }
}
