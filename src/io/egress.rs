//! Session summary egress - writes completed sessions to file
//!
//! Summaries are written in JSONL format (one JSON object per line)
//! to the file specified in config.

use crate::domain::summary::SessionSummary;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Egress writer for session summaries
pub struct Egress {
    file_path: String,
}

impl Egress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write a summary to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_summary(&self, summary: &SessionSummary) -> bool {
        let json = summary.to_json();

        match self.append_line(&json) {
            Ok(()) => {
                info!(
                    sid = %summary.sid,
                    category = %summary.category,
                    reason = %summary.reason.as_str(),
                    correct = %summary.score.correct,
                    skipped = %summary.score.skipped,
                    "summary_egressed"
                );
                true
            }
            Err(e) => {
                error!(
                    sid = %summary.sid,
                    error = %e,
                    "summary_egress_failed"
                );
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "egress_written");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::summary::{epoch_ms, new_uuid_v7, EndReason};
    use crate::domain::types::{ItemStatus, PlayItem, Score};
    use std::fs;
    use tempfile::tempdir;

    fn sample_summary() -> SessionSummary {
        SessionSummary {
            sid: new_uuid_v7(),
            category: "animals".to_string(),
            time_limit_secs: 60,
            reason: EndReason::Exhausted,
            score: Score { correct: 1, skipped: 1 },
            items: vec![
                PlayItem { text: "Lion".to_string(), status: ItemStatus::Correct },
                PlayItem { text: "Tiger".to_string(), status: ItemStatus::Skipped },
            ],
            started_at: epoch_ms(),
            ended_at: epoch_ms(),
        }
    }

    #[test]
    fn test_egress_new() {
        let egress = Egress::new("test.jsonl");
        assert_eq!(egress.file_path, "test.jsonl");
    }

    #[test]
    fn test_write_summary() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("sessions.jsonl");
        let file_str = file_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        let summary = sample_summary();

        assert!(egress.write_summary(&summary));

        // Verify file was created and contains valid JSON
        let content = fs::read_to_string(&file_path).unwrap();
        assert!(content.contains(&summary.sid));
        assert!(content.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["sid"], summary.sid);
        assert_eq!(parsed["cat"], "animals");
        assert_eq!(parsed["out"], "exhausted");
    }

    #[test]
    fn test_append_mode() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("sessions.jsonl");
        let file_str = file_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        egress.write_summary(&sample_summary());
        egress.write_summary(&sample_summary());

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        for line in lines {
            let _parsed: serde_json::Value = serde_json::from_str(line).unwrap();
        }
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested_path = dir.path().join("nested").join("dir").join("sessions.jsonl");
        let file_str = nested_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        assert!(egress.write_summary(&sample_summary()));
        assert!(nested_path.exists());
    }
}
