//! Shared types for the game session core

use serde::{Deserialize, Serialize};

/// One accelerometer reading. Only the z axis is interpreted by the
/// gesture layer; x/y are dropped at the sensor boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltSample {
    pub z: f64,
    /// Epoch milliseconds at which the sample was taken
    pub timestamp_ms: u64,
}

impl TiltSample {
    #[inline]
    pub fn new(z: f64, timestamp_ms: u64) -> Self {
        Self { z, timestamp_ms }
    }
}

/// Discrete decision applied to the current item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
    Correct,
    Skip,
}

impl ResolveAction {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveAction::Correct => "correct",
            ResolveAction::Skip => "skip",
        }
    }

    /// The action for the opposite tilt direction
    #[inline]
    pub fn opposite(&self) -> Self {
        match self {
            ResolveAction::Correct => ResolveAction::Skip,
            ResolveAction::Skip => ResolveAction::Correct,
        }
    }
}

/// Resolution state of a playable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Correct,
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Correct => "correct",
            ItemStatus::Skipped => "skipped",
        }
    }
}

/// A word in play plus its resolution status.
///
/// Created when a session starts (all `Pending`), resolved at most once,
/// never reverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayItem {
    pub text: String,
    pub status: ItemStatus,
}

impl PlayItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), status: ItemStatus::Pending }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == ItemStatus::Pending
    }
}

/// Score counters for one session.
///
/// Invariant: `correct + skipped` equals the number of resolved items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: u32,
    pub skipped: u32,
}

impl Score {
    #[inline]
    pub fn resolved(&self) -> u32 {
        self.correct + self.skipped
    }

    pub fn record(&mut self, action: ResolveAction) {
        match action {
            ResolveAction::Correct => self.correct += 1,
            ResolveAction::Skip => self.skipped += 1,
        }
    }
}

/// Finite phases of one play-through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Countdown,
    Active,
    Ended,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Countdown => "countdown",
            SessionPhase::Active => "active",
            SessionPhase::Ended => "ended",
        }
    }
}

/// Which physical tilt direction maps to Correct.
///
/// The mapping differed between device revisions, so it is configuration
/// rather than a hardcoded fact. `Normal` maps z toward the ceiling
/// (z > +threshold) to Correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TiltPolarity {
    #[default]
    Normal,
    Inverted,
}

impl TiltPolarity {
    /// Action emitted for a tilt past +threshold
    #[inline]
    pub fn forward_action(&self) -> ResolveAction {
        match self {
            TiltPolarity::Normal => ResolveAction::Correct,
            TiltPolarity::Inverted => ResolveAction::Skip,
        }
    }
}

impl std::str::FromStr for TiltPolarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(TiltPolarity::Normal),
            "inverted" => Ok(TiltPolarity::Inverted),
            other => Err(format!("unknown tilt polarity: {other}")),
        }
    }
}

/// Errors surfaced synchronously at session construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Zero items or a non-positive time limit
    InvalidInput(&'static str),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidInput(why) => write!(f, "invalid session input: {why}"),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_record() {
        let mut score = Score::default();
        score.record(ResolveAction::Correct);
        score.record(ResolveAction::Correct);
        score.record(ResolveAction::Skip);

        assert_eq!(score.correct, 2);
        assert_eq!(score.skipped, 1);
        assert_eq!(score.resolved(), 3);
    }

    #[test]
    fn test_play_item_starts_pending() {
        let item = PlayItem::new("Lion");
        assert_eq!(item.text, "Lion");
        assert!(item.is_pending());
    }

    #[test]
    fn test_polarity_mapping() {
        assert_eq!(TiltPolarity::Normal.forward_action(), ResolveAction::Correct);
        assert_eq!(TiltPolarity::Inverted.forward_action(), ResolveAction::Skip);
        assert_eq!(ResolveAction::Correct.opposite(), ResolveAction::Skip);
    }

    #[test]
    fn test_polarity_from_str() {
        assert_eq!("normal".parse::<TiltPolarity>().unwrap(), TiltPolarity::Normal);
        assert_eq!("inverted".parse::<TiltPolarity>().unwrap(), TiltPolarity::Inverted);
        assert!("sideways".parse::<TiltPolarity>().is_err());
    }
}
