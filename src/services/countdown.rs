//! Countdown sequence configuration
//!
//! The pre-game countdown is an ordered table of (label, hold) steps the
//! engine plays through with awaited delays. Several step layouts shipped
//! over time, so the table is configuration; only the invariants live in
//! code: steps run in order, each is held for its configured duration,
//! and no scoring or timer activity happens until the sequence finishes.

use serde::Deserialize;
use std::time::Duration;

/// One countdown step: a display label held for a fixed duration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountdownStep {
    pub label: String,
    pub hold_ms: u64,
}

impl CountdownStep {
    pub fn new(label: impl Into<String>, hold_ms: u64) -> Self {
        Self { label: label.into(), hold_ms }
    }

    #[inline]
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

/// The step table the original client shipped with: a settling cue, a
/// numeric countdown, then the go cue.
pub fn default_steps() -> Vec<CountdownStep> {
    vec![
        CountdownStep::new("Place on Forehead", 2000),
        CountdownStep::new("3", 1300),
        CountdownStep::new("2", 1300),
        CountdownStep::new("1", 1300),
        CountdownStep::new("Go!", 1400),
    ]
}

/// Total wall-clock duration of a step table
pub fn total_duration(steps: &[CountdownStep]) -> Duration {
    Duration::from_millis(steps.iter().map(|s| s.hold_ms).sum())
}
