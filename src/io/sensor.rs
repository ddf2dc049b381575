//! Tilt sample producers
//!
//! The engine consumes samples from an mpsc channel; where they come
//! from is an IO concern. Two producers are provided:
//! - `ScriptedSensor` replays a fixed z waveform at the configured
//!   interval (demo runs and tests)
//! - `load_replay` reads a recorded session from a JSONL file, one
//!   `{"z": ...}` object per line, for deterministic replays
//!
//! Both stamp samples with wall-clock epoch milliseconds when sent and
//! stop cleanly on shutdown.

use crate::domain::summary::epoch_ms;
use crate::domain::types::TiltSample;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tracing::{debug, info, warn};

/// One recorded replay entry
#[derive(Debug, Deserialize)]
struct ReplayRecord {
    z: f64,
}

/// Load a z waveform from a JSONL replay file
pub fn load_replay<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<f64>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay file {}", path.display()))?;

    let mut samples = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ReplayRecord = serde_json::from_str(line)
            .with_context(|| format!("Bad replay record at {}:{}", path.display(), lineno + 1))?;
        samples.push(record.z);
    }
    info!(file = %path.display(), samples = %samples.len(), "replay_loaded");
    Ok(samples)
}

/// A demo waveform: settle, tilt forward (correct), settle, tilt back
/// (skip), repeated. One value per sample interval.
pub fn demo_waveform(gestures: usize) -> Vec<f64> {
    let mut z = Vec::new();
    for i in 0..gestures {
        // A dozen level samples between gestures clears debounce and rearm
        z.extend(std::iter::repeat(0.0).take(12));
        let peak = if i % 2 == 0 { 1.0 } else { -1.0 };
        z.extend([peak * 0.5, peak, peak, peak * 0.5]);
    }
    z.extend(std::iter::repeat(0.0).take(12));
    z
}

/// Replays a fixed z waveform over the sample channel at a fixed rate.
pub struct ScriptedSensor {
    samples: Vec<f64>,
    sample_interval: Duration,
}

impl ScriptedSensor {
    pub fn new(samples: Vec<f64>, interval_ms: u64) -> Self {
        Self { samples, sample_interval: Duration::from_millis(interval_ms) }
    }

    /// Send every sample in order, then close the channel by dropping the
    /// sender. Stops early when shutdown flips.
    pub async fn run(self, tx: mpsc::Sender<TiltSample>, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            samples = %self.samples.len(),
            interval_ms = %self.sample_interval.as_millis(),
            "scripted_sensor_started"
        );
        let mut ticker = interval(self.sample_interval);

        for z in self.samples {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!("scripted_sensor_shutdown");
                        return;
                    }
                }
            }

            if tx.send(TiltSample::new(z, epoch_ms())).await.is_err() {
                // Engine gone; nothing left to feed
                warn!("scripted_sensor_channel_closed");
                return;
            }
        }
        info!("scripted_sensor_exhausted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_replay() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"z\": 0.0}}").unwrap();
        writeln!(file, "{{\"z\": 1.0}}").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{\"z\": -0.8}}").unwrap();
        file.flush().unwrap();

        let samples = load_replay(file.path()).unwrap();
        assert_eq!(samples, vec![0.0, 1.0, -0.8]);
    }

    #[test]
    fn test_load_replay_bad_record() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        file.flush().unwrap();

        assert!(load_replay(file.path()).is_err());
    }

    #[test]
    fn test_load_replay_missing_file() {
        assert!(load_replay("/nonexistent/replay.jsonl").is_err());
    }

    #[test]
    fn test_demo_waveform_shape() {
        let z = demo_waveform(2);
        // First gesture peaks positive, second negative
        assert!(z.iter().any(|&v| v >= 1.0));
        assert!(z.iter().any(|&v| v <= -1.0));
        // Starts and ends level
        assert_eq!(z[0], 0.0);
        assert_eq!(*z.last().unwrap(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_sensor_sends_all() {
        let sensor = ScriptedSensor::new(vec![0.0, 0.5, 1.0], 100);
        let (tx, mut rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        sensor.run(tx, shutdown_rx).await;

        let mut received = Vec::new();
        while let Ok(sample) = rx.try_recv() {
            received.push(sample.z);
        }
        assert_eq!(received, vec![0.0, 0.5, 1.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_sensor_stops_on_shutdown() {
        let sensor = ScriptedSensor::new(vec![0.0; 1000], 100);
        let (tx, mut rx) = mpsc::channel(2000);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        sensor.run(tx, shutdown_rx).await;

        // At most the first tick's sample got out before the signal
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert!(count <= 1);
    }
}
