//! Attention pipeline simulator binary.
//!
//! Runs a full session against a synthetic camera and viewer, gates a
//! logging player on the published attention state, and prints the
//! collected metrics on exit.

mod player;
mod synthetic;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use watchful_models::{display_coverage, Origin, SurfaceSize};
use watchful_pipeline::{AttentionTracker, PipelineConfig, PlaybackGate};

use crate::player::LoggingPlayer;
use crate::synthetic::{SyntheticDevices, SyntheticLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing()?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let run_for = Duration::from_secs(env_or("WATCHFUL_SIM_SECONDS", 10));
    let seed = env_or("WATCHFUL_SIM_SEED", 42);
    let frames_per_behaviour = env_or("WATCHFUL_SIM_FRAMES_PER_BEHAVIOUR", 90);
    let page_url = std::env::var("WATCHFUL_SIM_ORIGIN")
        .unwrap_or_else(|_| "https://localhost:3000/watch".to_string());
    let origin = Origin::parse(&page_url).with_context(|| format!("Invalid origin {page_url}"))?;

    let coverage = display_coverage(SurfaceSize::new(1280.0, 720.0), SurfaceSize::new(1920.0, 1080.0));
    info!(coverage_pct = coverage, "Player surface coverage");

    let mut tracker = AttentionTracker::new(
        config.clone(),
        Arc::new(SyntheticDevices::new(origin)),
        Arc::new(SyntheticLoader::new(seed, frames_per_behaviour)),
    );

    let gate = PlaybackGate::new(LoggingPlayer::default(), config.playback.clone());
    let gate_handle = tokio::spawn(gate.run(tracker.state().subscribe()));

    if let Err(e) = tracker.start_session().await {
        error!(kind = e.kind(), "Failed to start session: {}", e);
        if let Some(hint) = e.remediation_hint() {
            warn!("{}", hint);
        }
        return Err(e.into());
    }

    info!(seconds = run_for.as_secs(), "Simulating viewer");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received shutdown signal"),
        _ = tokio::time::sleep(run_for) => info!("Simulation finished"),
    }

    tracker.stop_session().await;
    let final_state = tracker.state().snapshot();
    info!(
        camera = %final_state.camera_status,
        status = %final_state.face_detection_status,
        "Final attention state"
    );
    drop(tracker);

    let player = gate_handle.await.context("Playback gate task failed")?;
    info!(
        plays = player.plays,
        pauses = player.pauses,
        volume = ?player.volume,
        "Playback summary"
    );

    println!("{}", metrics.render());
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("watchful=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
