//! Player that logs what the gate asks of it.

use tracing::info;
use watchful_pipeline::MediaPlayer;

/// Counts play/pause transitions and remembers the volume.
#[derive(Debug, Default)]
pub struct LoggingPlayer {
    pub plays: u32,
    pub pauses: u32,
    pub volume: Option<f64>,
}

impl MediaPlayer for LoggingPlayer {
    fn play(&mut self) {
        self.plays += 1;
        info!(plays = self.plays, "Player resumed");
    }

    fn pause(&mut self) {
        self.pauses += 1;
        info!(pauses = self.pauses, "Player paused");
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = Some(volume);
        info!(volume, "Player volume changed");
    }
}
