//! Refresh-synchronized scheduling.
//!
//! The detection loop waits on a `RefreshTicker` before every sample. The
//! default ticker follows a fixed display refresh rate; hosts with a real
//! vsync signal can provide their own.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Source of display refresh ticks.
#[async_trait]
pub trait RefreshTicker: Send {
    /// Resolve at the next refresh.
    async fn next_tick(&mut self);
}

/// Builds a fresh ticker for each session.
pub type TickerFactory = Arc<dyn Fn() -> Box<dyn RefreshTicker> + Send + Sync>;

/// Ticker driven by `tokio::time::interval`.
///
/// Missed ticks are skipped rather than bursted, so a slow estimation never
/// causes back-to-back samples.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Factory producing interval tickers with the given period.
    pub fn factory(period: Duration) -> TickerFactory {
        Arc::new(move || Box::new(IntervalTicker::new(period)) as Box<dyn RefreshTicker>)
    }
}

#[async_trait]
impl RefreshTicker for IntervalTicker {
    async fn next_tick(&mut self) {
        self.interval.tick().await;
    }
}
