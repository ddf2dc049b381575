//! Domain models - core game types and the session summary
//!
//! This module contains the canonical data types used throughout the system:
//! - `PlayItem` - a single playable word plus its resolution status
//! - `Score` - correct/skipped counters for one session
//! - `TiltSample` - one accelerometer reading (only `z` is interpreted)
//! - `ResolveAction` - the discrete Correct/Skip decision
//! - `SessionSummary` - the terminal artifact handed back when a session ends

pub mod summary;
pub mod types;
