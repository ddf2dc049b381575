//! Session summary - the terminal artifact of one play-through

use crate::domain::types::{PlayItem, Score};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// How the session reached `Ended`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Every item was resolved before the clock ran out
    Exhausted,
    /// The countdown timer reached zero
    TimedOut,
    /// Explicit external stop (user exit, app teardown)
    Stopped,
}

impl EndReason {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Exhausted => "exhausted",
            EndReason::TimedOut => "timed_out",
            EndReason::Stopped => "stopped",
        }
    }
}

/// Complete record of one finished session.
///
/// Snapshotted from the controller the moment it transitions to `Ended`;
/// the surrounding application persists or displays it, the session itself
/// is discarded.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub sid: String, // UUIDv7 session ID
    pub category: String,
    pub time_limit_secs: u32,
    pub reason: EndReason,
    pub score: Score,
    pub items: Vec<PlayItem>,
    pub started_at: u64,       // epoch ms
    pub ended_at: u64,         // epoch ms
}

impl SessionSummary {
    /// Number of items never resolved
    pub fn pending(&self) -> usize {
        self.items.iter().filter(|i| i.is_pending()).count()
    }

    /// Convert to short-key JSON string (one line in the egress file)
    pub fn to_json(&self) -> String {
        let mut obj = serde_json::Map::new();

        obj.insert("sid".to_string(), serde_json::Value::String(self.sid.clone()));
        obj.insert("cat".to_string(), serde_json::Value::String(self.category.clone()));
        obj.insert("limit".to_string(), serde_json::Value::Number(self.time_limit_secs.into()));
        obj.insert("out".to_string(), serde_json::Value::String(self.reason.as_str().to_string()));
        obj.insert("ok".to_string(), serde_json::Value::Number(self.score.correct.into()));
        obj.insert("skip".to_string(), serde_json::Value::Number(self.score.skipped.into()));

        let items: Vec<serde_json::Value> = self
            .items
            .iter()
            .map(|item| {
                let mut entry = serde_json::Map::new();
                entry.insert("w".to_string(), serde_json::Value::String(item.text.clone()));
                entry.insert(
                    "st".to_string(),
                    serde_json::Value::String(item.status.as_str().to_string()),
                );
                serde_json::Value::Object(entry)
            })
            .collect();
        obj.insert("items".to_string(), serde_json::Value::Array(items));

        obj.insert("t0".to_string(), serde_json::Value::Number(self.started_at.into()));
        obj.insert("t1".to_string(), serde_json::Value::Number(self.ended_at.into()));

        serde_json::Value::Object(obj).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ItemStatus;

    fn sample_summary() -> SessionSummary {
        SessionSummary {
            sid: new_uuid_v7(),
            category: "animals".to_string(),
            time_limit_secs: 60,
            reason: EndReason::Exhausted,
            score: Score { correct: 2, skipped: 1 },
            items: vec![
                PlayItem { text: "Lion".to_string(), status: ItemStatus::Correct },
                PlayItem { text: "Tiger".to_string(), status: ItemStatus::Skipped },
                PlayItem { text: "Zebra".to_string(), status: ItemStatus::Correct },
            ],
            started_at: 1736012340000,
            ended_at: 1736012400000,
        }
    }

    #[test]
    fn test_summary_to_json() {
        let summary = sample_summary();
        let json = summary.to_json();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["sid"], summary.sid);
        assert_eq!(parsed["cat"], "animals");
        assert_eq!(parsed["limit"], 60);
        assert_eq!(parsed["out"], "exhausted");
        assert_eq!(parsed["ok"], 2);
        assert_eq!(parsed["skip"], 1);
        assert_eq!(parsed["t0"], 1736012340000_u64);
        assert_eq!(parsed["t1"], 1736012400000_u64);

        let items = parsed["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["w"], "Lion");
        assert_eq!(items[0]["st"], "correct");
        assert_eq!(items[1]["st"], "skipped");
    }

    #[test]
    fn test_pending_count() {
        let mut summary = sample_summary();
        assert_eq!(summary.pending(), 0);

        summary.items.push(PlayItem::new("Panda"));
        assert_eq!(summary.pending(), 1);
    }

    #[test]
    fn test_uuid_v7_generation() {
        let uuid1 = new_uuid_v7();
        let uuid2 = new_uuid_v7();

        assert!(!uuid1.is_empty());
        assert_ne!(uuid1, uuid2);
        // UUIDv7 should be 36 chars with hyphens
        assert_eq!(uuid1.len(), 36);
    }

    #[test]
    fn test_end_reason_as_str() {
        assert_eq!(EndReason::Exhausted.as_str(), "exhausted");
        assert_eq!(EndReason::TimedOut.as_str(), "timed_out");
        assert_eq!(EndReason::Stopped.as_str(), "stopped");
    }
}
