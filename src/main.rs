//! Tiltdeck - headless session runner for the tilt-to-score party game
//!
//! Plays one full session against a scripted or replayed sensor stream
//! and writes the terminal summary to the egress file.
//!
//! Module structure:
//! - `domain/` - Core game types (PlayItem, Score, TiltSample, SessionSummary)
//! - `io/` - External interfaces (sensor sources, egress, deck store, generate)
//! - `services/` - Game logic (SessionController, GestureInterpreter, SessionEngine)
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tiltdeck::infra::{Config, Metrics};
use tiltdeck::io::sensor::{demo_waveform, load_replay};
use tiltdeck::io::{DeckStore, Egress, GenerateClient, ScriptedSensor};
use tiltdeck::services::{GestureConfig, GestureInterpreter, SessionController, SessionEngine};
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Tiltdeck - forehead party game session engine
#[derive(Parser, Debug)]
#[command(name = "tiltdeck", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,

    /// Deck to play from the local store (or the category to generate)
    #[arg(short, long, default_value = "animals")]
    deck: String,

    /// Requested time limit in seconds (clamped to the configured range)
    #[arg(short, long)]
    time_limit: Option<u32>,

    /// Generate the deck from the remote endpoint instead of the local store
    #[arg(long)]
    generate: bool,

    /// Replay a recorded z waveform (JSONL, one {"z": ...} per line)
    #[arg(long)]
    replay: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("tiltdeck starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        tilt_threshold = %config.tilt_threshold(),
        rearm_threshold = %config.rearm_threshold(),
        debounce_ms = %config.debounce_ms(),
        grace_ms = %config.grace_ms(),
        sensor_interval_ms = %config.sensor_interval_ms(),
        decks_file = %config.decks_file(),
        egress_file = %config.egress_file(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());

    // Start metrics reporter (lock-free reads)
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Resolve the deck: remote generation or the local store
    let mut items = if args.generate {
        let client = GenerateClient::new(
            config.generate_url(),
            config.generate_count(),
            config.generate_timeout_ms(),
        );
        client.generate(&args.deck).await?
    } else {
        let store = DeckStore::new(config.decks_file());
        store.init_defaults()?;
        store
            .deck(&args.deck)
            .ok_or_else(|| format!("no deck named '{}' in {}", args.deck, config.decks_file()))?
    };
    items.shuffle(&mut rand::thread_rng());
    let item_count = items.len();

    let requested = args.time_limit.unwrap_or_else(|| config.default_time_limit_secs());
    let time_limit = config.clamp_time_limit(requested);

    let session = SessionController::new(&args.deck, items, time_limit)?;
    let gesture = GestureInterpreter::new(GestureConfig {
        tilt_threshold: config.tilt_threshold(),
        rearm_threshold: config.rearm_threshold(),
        debounce_ms: config.debounce_ms(),
        grace_ms: config.grace_ms(),
        polarity: config.polarity(),
    });
    let engine = SessionEngine::new(
        session,
        gesture,
        config.countdown_steps().to_vec(),
        metrics.clone(),
    )
    .with_egress(Egress::new(config.egress_file()));

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Sample channel (bounded for backpressure)
    let (sample_tx, sample_rx) = mpsc::channel(256);

    // Start the sensor source: a recorded replay or the demo waveform
    let waveform = match &args.replay {
        Some(path) => load_replay(path)?,
        None => demo_waveform(item_count),
    };
    let sensor = ScriptedSensor::new(waveform, config.sensor_interval_ms());
    let sensor_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        sensor.run(sample_tx, sensor_shutdown).await;
    });

    // Handle shutdown on Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_tx.send(true);
    });

    // Run the session to completion
    if let Some(summary) = engine.run(sample_rx, shutdown_rx).await {
        info!(
            sid = %summary.sid,
            category = %summary.category,
            reason = %summary.reason.as_str(),
            correct = %summary.score.correct,
            skipped = %summary.score.skipped,
            pending = %summary.pending(),
            "session_complete"
        );
    }

    metrics.report().log();
    info!("tiltdeck shutdown complete");
    Ok(())
}
