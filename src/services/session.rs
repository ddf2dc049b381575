//! Session lifecycle state machine
//!
//! The SessionController is the sole mutator of one play-through:
//! idle -> countdown -> active -> ended. Every mutating entry point is
//! phase-guarded so late ticks, samples, and duplicate resolves arriving
//! after a transition are silent no-ops.

use crate::domain::summary::{epoch_ms, new_uuid_v7, EndReason, SessionSummary};
use crate::domain::types::{
    ItemStatus, PlayItem, ResolveAction, Score, SessionError, SessionPhase,
};
use tracing::{debug, info};

/// Owns the session aggregate and its finite-state progression.
///
/// The controller is synchronous and pure in its transitions; the async
/// engine decides *when* to call `tick`/`resolve`/`stop`.
#[derive(Debug)]
pub struct SessionController {
    sid: String,
    category: String,
    items: Vec<PlayItem>,
    current_index: usize,
    time_limit_secs: u32,
    time_remaining_secs: u32,
    phase: SessionPhase,
    score: Score,
    started_at: u64,
}

impl SessionController {
    /// Create a session in `Idle` with all items pending.
    ///
    /// Fails with `InvalidInput` when `items` is empty or the time limit
    /// is zero. Callers are expected to clamp the limit into the
    /// configured range beforehand; only positivity is required here.
    pub fn new(
        category: impl Into<String>,
        items: Vec<String>,
        time_limit_secs: u32,
    ) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::InvalidInput("session requires at least one item"));
        }
        if time_limit_secs == 0 {
            return Err(SessionError::InvalidInput("time limit must be positive"));
        }

        let sid = new_uuid_v7();
        let category = category.into();
        info!(
            sid = %sid,
            category = %category,
            items = %items.len(),
            time_limit_secs = %time_limit_secs,
            "session_created"
        );

        Ok(Self {
            sid,
            category,
            items: items.into_iter().map(PlayItem::new).collect(),
            current_index: 0,
            time_limit_secs,
            time_remaining_secs: time_limit_secs,
            phase: SessionPhase::Idle,
            score: Score::default(),
            started_at: epoch_ms(),
        })
    }

    /// Idle -> Countdown. Duplicate calls are no-ops.
    /// Returns true if the transition happened.
    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Idle {
            debug!(sid = %self.sid, phase = %self.phase.as_str(), "start_ignored");
            return false;
        }
        self.phase = SessionPhase::Countdown;
        self.started_at = epoch_ms();
        info!(sid = %self.sid, "session_countdown");
        true
    }

    /// Countdown -> Active. Resets the clock to the full time limit.
    /// Returns true if the transition happened.
    pub fn begin_active(&mut self) -> bool {
        if self.phase != SessionPhase::Countdown {
            debug!(sid = %self.sid, phase = %self.phase.as_str(), "begin_active_ignored");
            return false;
        }
        self.phase = SessionPhase::Active;
        self.time_remaining_secs = self.time_limit_secs;
        info!(sid = %self.sid, time_limit_secs = %self.time_limit_secs, "session_active");
        true
    }

    /// One-second timer tick. Decrements the clock; at zero the session
    /// ends on the time-out path. Outside `Active` this is a no-op.
    pub fn tick(&mut self) -> Option<SessionSummary> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        self.time_remaining_secs = self.time_remaining_secs.saturating_sub(1);
        debug!(sid = %self.sid, remaining = %self.time_remaining_secs, "session_tick");
        if self.time_remaining_secs == 0 {
            return Some(self.end(EndReason::TimedOut));
        }
        None
    }

    /// Apply a resolve action to the current item.
    ///
    /// Only acts while `Active` and only on a still-pending, in-range
    /// item; anything else (duplicate delivery, out-of-range index) is a
    /// silent no-op so a gesture double-fire can never double-count.
    /// Resolving the last item ends the session on the exhaustion path.
    pub fn resolve(&mut self, action: ResolveAction) -> Option<SessionSummary> {
        if self.phase != SessionPhase::Active {
            debug!(phase = %self.phase.as_str(), action = %action.as_str(), "resolve_ignored");
            return None;
        }
        let Some(item) = self.items.get_mut(self.current_index) else {
            return None;
        };
        if !item.is_pending() {
            debug!(index = %self.current_index, "resolve_duplicate_ignored");
            return None;
        }

        item.status = match action {
            ResolveAction::Correct => ItemStatus::Correct,
            ResolveAction::Skip => ItemStatus::Skipped,
        };
        self.score.record(action);
        info!(
            sid = %self.sid,
            index = %self.current_index,
            action = %action.as_str(),
            correct = %self.score.correct,
            skipped = %self.score.skipped,
            "item_resolved"
        );

        if self.current_index + 1 < self.items.len() {
            self.current_index += 1;
            None
        } else {
            self.current_index += 1; // index may equal items.len() once exhausted
            Some(self.end(EndReason::Exhausted))
        }
    }

    /// Explicit external stop. Ends the session from any non-terminal
    /// phase with whatever was accumulated; `Ended` stays ended.
    pub fn stop(&mut self) -> Option<SessionSummary> {
        if self.phase == SessionPhase::Ended {
            return None;
        }
        Some(self.end(EndReason::Stopped))
    }

    fn end(&mut self, reason: EndReason) -> SessionSummary {
        self.phase = SessionPhase::Ended;
        let summary = SessionSummary {
            sid: self.sid.clone(),
            category: self.category.clone(),
            time_limit_secs: self.time_limit_secs,
            reason,
            score: self.score,
            items: self.items.clone(),
            started_at: self.started_at,
            ended_at: epoch_ms(),
        };
        info!(
            sid = %self.sid,
            reason = %reason.as_str(),
            correct = %self.score.correct,
            skipped = %self.score.skipped,
            pending = %summary.pending(),
            "session_ended"
        );
        summary
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_secs
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Text of the item currently in play, if any
    pub fn current_item(&self) -> Option<&str> {
        self.items.get(self.current_index).map(|i| i.text.as_str())
    }

    pub fn items(&self) -> &[PlayItem] {
        &self.items
    }
}
