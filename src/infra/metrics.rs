//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are
//! statistical counters only. Do NOT use these atomics for coordination
//! or logic decisions.

use crate::domain::summary::{EndReason, SessionSummary};
use crate::domain::types::ResolveAction;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Metrics collector shared across tasks
pub struct Metrics {
    /// Sensor samples fed through the gesture interpreter
    samples_total: AtomicU64,
    /// Cumulative sample-processing latency (for averaging)
    sample_latency_sum_us: AtomicU64,
    /// Worst sample-processing latency seen
    max_sample_latency_us: AtomicU64,
    /// Discrete actions emitted by the interpreter
    actions_correct: AtomicU64,
    actions_skip: AtomicU64,
    /// Session lifecycle counters
    sessions_started: AtomicU64,
    sessions_exhausted: AtomicU64,
    sessions_timed_out: AtomicU64,
    sessions_stopped: AtomicU64,
    /// Item outcomes across completed sessions
    items_correct: AtomicU64,
    items_skipped: AtomicU64,
    /// Report clock (only touched by the reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            samples_total: AtomicU64::new(0),
            sample_latency_sum_us: AtomicU64::new(0),
            max_sample_latency_us: AtomicU64::new(0),
            actions_correct: AtomicU64::new(0),
            actions_skip: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            sessions_exhausted: AtomicU64::new(0),
            sessions_timed_out: AtomicU64::new(0),
            sessions_stopped: AtomicU64::new(0),
            items_correct: AtomicU64::new(0),
            items_skipped: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    pub fn record_sample(&self, latency_us: u64) {
        self.samples_total.fetch_add(1, Ordering::Relaxed);
        self.sample_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.max_sample_latency_us, latency_us);
    }

    pub fn record_action(&self, action: ResolveAction) {
        match action {
            ResolveAction::Correct => self.actions_correct.fetch_add(1, Ordering::Relaxed),
            ResolveAction::Skip => self.actions_skip.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_ended(&self, summary: &SessionSummary) {
        match summary.reason {
            EndReason::Exhausted => self.sessions_exhausted.fetch_add(1, Ordering::Relaxed),
            EndReason::TimedOut => self.sessions_timed_out.fetch_add(1, Ordering::Relaxed),
            EndReason::Stopped => self.sessions_stopped.fetch_add(1, Ordering::Relaxed),
        };
        self.items_correct.fetch_add(summary.score.correct as u64, Ordering::Relaxed);
        self.items_skipped.fetch_add(summary.score.skipped as u64, Ordering::Relaxed);
    }

    /// Snapshot current counters for reporting
    pub fn report(&self) -> MetricsSummary {
        let mut last_report = self.last_report_time.lock();
        let elapsed_secs = last_report.elapsed().as_secs_f64();
        *last_report = Instant::now();
        drop(last_report);

        let samples_total = self.samples_total.load(Ordering::Relaxed);
        let latency_sum = self.sample_latency_sum_us.load(Ordering::Relaxed);
        let avg_sample_latency_us =
            if samples_total > 0 { latency_sum / samples_total } else { 0 };

        MetricsSummary {
            elapsed_secs,
            samples_total,
            samples_per_sec: if elapsed_secs > 0.0 {
                samples_total as f64 / elapsed_secs
            } else {
                0.0
            },
            avg_sample_latency_us,
            max_sample_latency_us: self.max_sample_latency_us.load(Ordering::Relaxed),
            actions_correct: self.actions_correct.load(Ordering::Relaxed),
            actions_skip: self.actions_skip.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_exhausted: self.sessions_exhausted.load(Ordering::Relaxed),
            sessions_timed_out: self.sessions_timed_out.load(Ordering::Relaxed),
            sessions_stopped: self.sessions_stopped.load(Ordering::Relaxed),
            items_correct: self.items_correct.load(Ordering::Relaxed),
            items_skipped: self.items_skipped.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub elapsed_secs: f64,
    pub samples_total: u64,
    pub samples_per_sec: f64,
    pub avg_sample_latency_us: u64,
    pub max_sample_latency_us: u64,
    pub actions_correct: u64,
    pub actions_skip: u64,
    pub sessions_started: u64,
    pub sessions_exhausted: u64,
    pub sessions_timed_out: u64,
    pub sessions_stopped: u64,
    pub items_correct: u64,
    pub items_skipped: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            samples = %self.samples_total,
            samples_per_sec = %format!("{:.1}", self.samples_per_sec),
            avg_latency_us = %self.avg_sample_latency_us,
            max_latency_us = %self.max_sample_latency_us,
            actions_correct = %self.actions_correct,
            actions_skip = %self.actions_skip,
            sessions_started = %self.sessions_started,
            sessions_exhausted = %self.sessions_exhausted,
            sessions_timed_out = %self.sessions_timed_out,
            sessions_stopped = %self.sessions_stopped,
            items_correct = %self.items_correct,
            items_skipped = %self.items_skipped,
            "metrics_report"
        );
    }
}
