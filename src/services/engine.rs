//! Session orchestration
//!
//! The SessionEngine is the single task that drives one play-through:
//! it steps the countdown with cancellable delays, then runs a biased
//! select over shutdown, sensor samples, and the one-second ticker.
//! All controller mutation happens here, so there is no concurrent
//! writer and no locking.
//!
//! Producer lifecycle: the gesture interpreter is armed only for the
//! Active phase, and the ticker lives inside `run`, so leaving Active
//! (exhaustion, timeout, stop) drops both. Late samples or ticks that
//! slip through are absorbed by the controller's phase guards.

use crate::domain::summary::{epoch_ms, SessionSummary};
use crate::domain::types::{ResolveAction, Score, TiltSample};
use crate::infra::metrics::Metrics;
use crate::io::egress::Egress;
use crate::services::countdown::CountdownStep;
use crate::services::gesture::GestureInterpreter;
use crate::services::session::SessionController;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Progress notifications for front-ends (TUI, logs).
///
/// Sent best-effort: a slow or absent consumer never blocks the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A countdown label is now showing
    CountdownStep { label: String },
    /// Countdown finished; play has begun
    Activated { word: String, remaining_secs: u32 },
    /// One second elapsed
    Tick { remaining_secs: u32 },
    /// The current item was resolved; `next_word` is None on the last item
    Resolved {
        action: ResolveAction,
        word: String,
        score: Score,
        next_word: Option<String>,
    },
    /// Terminal state reached
    Ended { summary: SessionSummary },
}

/// Drives one session from countdown to summary.
pub struct SessionEngine {
    session: SessionController,
    gesture: GestureInterpreter,
    countdown: Vec<CountdownStep>,
    metrics: Arc<Metrics>,
    egress: Option<Egress>,
    event_tx: Option<mpsc::Sender<SessionEvent>>,
}

impl SessionEngine {
    pub fn new(
        session: SessionController,
        gesture: GestureInterpreter,
        countdown: Vec<CountdownStep>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { session, gesture, countdown, metrics, egress: None, event_tx: None }
    }

    /// Write the terminal summary to this egress when the session ends
    pub fn with_egress(mut self, egress: Egress) -> Self {
        self.egress = Some(egress);
        self
    }

    /// Publish progress events to this channel
    pub fn with_event_tx(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Run the session to completion.
    ///
    /// Consumes samples from `sample_rx` while Active; `shutdown_rx`
    /// flipping to true is observed at the next suspension point and ends
    /// the session with whatever was accumulated. Returns the summary,
    /// or None when the controller was not in a startable state.
    pub async fn run(
        mut self,
        mut sample_rx: mpsc::Receiver<TiltSample>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Option<SessionSummary> {
        if !self.session.start() {
            warn!(sid = %self.session.sid(), "engine_start_rejected");
            return None;
        }
        self.metrics.record_session_started();

        // Countdown: purely presentational delay, cancellable at every
        // suspension point. No scoring or timer activity here.
        for step in self.countdown.clone() {
            self.send_event(SessionEvent::CountdownStep { label: step.label.clone() });
            info!(label = %step.label, hold_ms = %step.hold_ms, "countdown_step");

            tokio::select! {
                _ = tokio::time::sleep(step.hold()) => {}
                _ = shutdown_signal(&mut shutdown_rx) => {
                    info!(sid = %self.session.sid(), "countdown_cancelled");
                    let summary = self.session.stop();
                    return self.finish(summary);
                }
            }
        }

        self.session.begin_active();
        self.gesture.arm(epoch_ms());
        self.send_event(SessionEvent::Activated {
            word: self.session.current_item().unwrap_or_default().to_string(),
            remaining_secs: self.session.time_remaining_secs(),
        });

        // First tick one full second after activation
        let mut ticker = tokio::time::interval_at(
            Instant::now() + Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let mut sensor_open = true;

        let summary = loop {
            tokio::select! {
                // Ordering matters: stop wins over everything, and a
                // resolve that closes the session wins over a
                // simultaneous timer expiry.
                biased;

                _ = shutdown_signal(&mut shutdown_rx) => {
                    info!(sid = %self.session.sid(), "session_stop_requested");
                    break self.session.stop();
                }

                sample = sample_rx.recv(), if sensor_open => {
                    match sample {
                        Some(s) => {
                            if let Some(summary) = self.handle_sample(s) {
                                break Some(summary);
                            }
                        }
                        None => {
                            // Sensor producer gone; play continues on the
                            // timer alone.
                            warn!(sid = %self.session.sid(), "sensor_stream_closed");
                            sensor_open = false;
                        }
                    }
                }

                _ = ticker.tick() => {
                    if let Some(summary) = self.session.tick() {
                        break Some(summary);
                    }
                    self.send_event(SessionEvent::Tick {
                        remaining_secs: self.session.time_remaining_secs(),
                    });
                }
            }
        };

        self.finish(summary)
    }

    /// Feed one sample through the interpreter and apply any action.
    /// Returns the summary when the resolve exhausted the deck.
    fn handle_sample(&mut self, sample: TiltSample) -> Option<SessionSummary> {
        let process_start = std::time::Instant::now();
        let action = self.gesture.on_sample(sample.z, sample.timestamp_ms);
        self.metrics.record_sample(process_start.elapsed().as_micros() as u64);

        let action = action?;
        self.metrics.record_action(action);

        let word = self.session.current_item().unwrap_or_default().to_string();
        let summary = self.session.resolve(action);
        self.send_event(SessionEvent::Resolved {
            action,
            word,
            score: self.session.score(),
            next_word: self.session.current_item().map(str::to_string),
        });
        summary
    }

    /// Common teardown for every exit path: disarm, egress, notify.
    fn finish(&mut self, summary: Option<SessionSummary>) -> Option<SessionSummary> {
        self.gesture.disarm();
        let summary = summary?;

        self.metrics.record_session_ended(&summary);
        if let Some(egress) = &self.egress {
            egress.write_summary(&summary);
        }
        self.send_event(SessionEvent::Ended { summary: summary.clone() });
        Some(summary)
    }

    fn send_event(&self, event: SessionEvent) {
        let Some(tx) = &self.event_tx else { return };
        if let Err(e) = tx.try_send(event) {
            // Front-end lagging or gone; the session must not block on it
            debug!(error = %e, "session_event_dropped");
        }
    }
}

/// Resolve once the shutdown flag is true; pend forever if the sender is
/// dropped without ever signalling.
async fn shutdown_signal(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::summary::EndReason;
    use crate::domain::types::ItemStatus;
    use crate::services::countdown::CountdownStep;
    use crate::services::gesture::GestureConfig;

    fn test_engine(items: &[&str], limit: u32) -> SessionEngine {
        let session = SessionController::new(
            "test",
            items.iter().map(|s| s.to_string()).collect(),
            limit,
        )
        .unwrap();
        // Zero grace/debounce so fabricated timestamps stay simple
        let gesture = GestureInterpreter::new(GestureConfig {
            grace_ms: 0,
            debounce_ms: 0,
            ..GestureConfig::default()
        });
        let countdown = vec![CountdownStep::new("3", 100), CountdownStep::new("Go!", 100)];
        SessionEngine::new(session, gesture, countdown, Arc::new(Metrics::new()))
    }

    /// Samples carry far-future timestamps so the real-clock grace window
    /// in `arm(epoch_ms())` can never swallow them under paused tokio time.
    fn far_future_ms(offset: u64) -> u64 {
        epoch_ms() + 60_000 + offset
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_exhaustion_path() {
        let engine = test_engine(&["A", "B"], 60);
        let (sample_tx, sample_rx) = mpsc::channel(64);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        // Tilt up, level, tilt up: two corrects
        sample_tx.send(TiltSample::new(1.0, far_future_ms(0))).await.unwrap();
        sample_tx.send(TiltSample::new(0.0, far_future_ms(100))).await.unwrap();
        sample_tx.send(TiltSample::new(1.0, far_future_ms(200))).await.unwrap();

        let summary = engine.run(sample_rx, shutdown_rx).await.unwrap();
        assert_eq!(summary.reason, EndReason::Exhausted);
        assert_eq!(summary.score, Score { correct: 2, skipped: 0 });
        assert!(summary.items.iter().all(|i| i.status == ItemStatus::Correct));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_timeout_path() {
        let engine = test_engine(&["A", "B"], 2);
        let (_sample_tx, sample_rx) = mpsc::channel::<TiltSample>(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let summary = engine.run(sample_rx, shutdown_rx).await.unwrap();
        assert_eq!(summary.reason, EndReason::TimedOut);
        assert_eq!(summary.score, Score::default());
        assert!(summary.items.iter().all(|i| i.is_pending()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_stop_mid_countdown() {
        let engine = test_engine(&["A"], 60);
        let (_sample_tx, sample_rx) = mpsc::channel::<TiltSample>(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Stop before the countdown can complete
        shutdown_tx.send(true).unwrap();

        let summary = engine.run(sample_rx, shutdown_rx).await.unwrap();
        assert_eq!(summary.reason, EndReason::Stopped);
        assert!(summary.items.iter().all(|i| i.is_pending()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_sensor_closed_keeps_playing() {
        let engine = test_engine(&["A"], 1);
        let (sample_tx, sample_rx) = mpsc::channel::<TiltSample>(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(sample_tx);

        let summary = engine.run(sample_rx, shutdown_rx).await.unwrap();
        assert_eq!(summary.reason, EndReason::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_engine_publishes_terminal_event() {
        let engine = test_engine(&["A"], 1);
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let engine = engine.with_event_tx(event_tx);
        let (_sample_tx, sample_rx) = mpsc::channel::<TiltSample>(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        engine.run(sample_rx, shutdown_rx).await.unwrap();

        let mut saw_countdown = false;
        let mut saw_ended = false;
        while let Ok(event) = event_rx.try_recv() {
            match event {
                SessionEvent::CountdownStep { .. } => saw_countdown = true,
                SessionEvent::Ended { summary } => {
                    saw_ended = true;
                    assert_eq!(summary.reason, EndReason::TimedOut);
                }
                _ => {}
            }
        }
        assert!(saw_countdown);
        assert!(saw_ended);
    }
}
