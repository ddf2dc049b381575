//! Tilt gesture interpretation
//!
//! Converts the continuous accelerometer z stream into at most one
//! discrete action per physical tilt. Three mechanisms cooperate:
//! - a grace window after arming, during which all samples are dropped
//!   (the device is still being settled against the forehead)
//! - a debounce window bounding the minimum time between two accepted
//!   actions
//! - a re-arm latch that only opens once the device has returned to
//!   roughly level, so one tilt crossing the threshold twice cannot be
//!   read as two gestures

use crate::domain::types::{ResolveAction, TiltPolarity};
use tracing::debug;

/// Tunable gesture parameters. Invariant: `rearm_threshold < tilt_threshold`.
#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    pub tilt_threshold: f64,
    pub rearm_threshold: f64,
    pub debounce_ms: u64,
    pub grace_ms: u64,
    pub polarity: TiltPolarity,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tilt_threshold: 0.7,
            rearm_threshold: 0.3,
            debounce_ms: 1000,
            grace_ms: 1000,
            polarity: TiltPolarity::Normal,
        }
    }
}

/// Stateful sample-to-action interpreter.
///
/// Armed only while the session is active; disarmed interpreters drop
/// all samples. State is a pure function of the sample stream, making
/// the machine testable without a real sensor.
pub struct GestureInterpreter {
    config: GestureConfig,
    armed: bool,
    armed_at_ms: u64,
    last_action_at_ms: Option<u64>,
    can_trigger: bool,
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            armed: false,
            armed_at_ms: 0,
            last_action_at_ms: None,
            can_trigger: true,
        }
    }

    /// Begin consuming samples. Starts the settling grace window.
    pub fn arm(&mut self, now_ms: u64) {
        self.armed = true;
        self.armed_at_ms = now_ms;
        self.last_action_at_ms = None;
        self.can_trigger = true;
        debug!(grace_ms = %self.config.grace_ms, "gesture_armed");
    }

    /// Stop consuming samples and discard in-flight debounce state.
    pub fn disarm(&mut self) {
        self.armed = false;
        self.last_action_at_ms = None;
        self.can_trigger = true;
        debug!("gesture_disarmed");
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Process one z sample, emitting at most one action.
    pub fn on_sample(&mut self, z: f64, now_ms: u64) -> Option<ResolveAction> {
        if !self.armed {
            return None;
        }

        // Settling window: drop everything, including re-arm updates
        if now_ms < self.armed_at_ms + self.config.grace_ms {
            return None;
        }

        let debounced = self
            .last_action_at_ms
            .is_some_and(|t| now_ms.saturating_sub(t) < self.config.debounce_ms);

        let mut action = None;
        if !debounced && self.can_trigger {
            if z > self.config.tilt_threshold {
                action = Some(self.config.polarity.forward_action());
            } else if z < -self.config.tilt_threshold {
                action = Some(self.config.polarity.forward_action().opposite());
            }
            if let Some(a) = action {
                self.can_trigger = false;
                self.last_action_at_ms = Some(now_ms);
                debug!(z = %z, action = %a.as_str(), "gesture_triggered");
            }
        }

        // Re-arm once the device is roughly level again. Applies to every
        // sample past the grace window, debounced or not.
        if z.abs() < self.config.rearm_threshold {
            self.can_trigger = true;
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_interpreter() -> GestureInterpreter {
        // Zero grace keeps timestamps in tests small
        let mut interp = GestureInterpreter::new(GestureConfig {
            grace_ms: 0,
            ..GestureConfig::default()
        });
        interp.arm(0);
        interp
    }

    #[test]
    fn test_disarmed_drops_samples() {
        let mut interp = GestureInterpreter::new(GestureConfig::default());
        assert_eq!(interp.on_sample(1.0, 5000), None);
    }

    #[test]
    fn test_tilt_up_is_correct() {
        let mut interp = armed_interpreter();
        assert_eq!(interp.on_sample(1.0, 0), Some(ResolveAction::Correct));
    }

    #[test]
    fn test_tilt_down_is_skip() {
        let mut interp = armed_interpreter();
        assert_eq!(interp.on_sample(-1.0, 0), Some(ResolveAction::Skip));
    }

    #[test]
    fn test_inverted_polarity() {
        let mut interp = GestureInterpreter::new(GestureConfig {
            grace_ms: 0,
            polarity: TiltPolarity::Inverted,
            ..GestureConfig::default()
        });
        interp.arm(0);

        assert_eq!(interp.on_sample(1.0, 0), Some(ResolveAction::Skip));
        assert_eq!(interp.on_sample(0.0, 600), None);
        assert_eq!(interp.on_sample(-1.0, 1100), Some(ResolveAction::Correct));
    }

    #[test]
    fn test_below_threshold_no_action() {
        let mut interp = armed_interpreter();
        assert_eq!(interp.on_sample(0.5, 0), None);
        assert_eq!(interp.on_sample(-0.69, 100), None);
    }

    #[test]
    fn test_debounce_window_blocks_second_action() {
        let mut interp = armed_interpreter();
        assert_eq!(interp.on_sample(1.0, 0), Some(ResolveAction::Correct));
        // Sustained tilt inside the debounce window fires nothing
        assert_eq!(interp.on_sample(1.0, 500), None);
        assert_eq!(interp.on_sample(1.0, 999), None);
    }

    #[test]
    fn test_rearm_then_second_action() {
        let mut interp = armed_interpreter();
        assert_eq!(interp.on_sample(1.0, 0), Some(ResolveAction::Correct));
        // Level sample inside the debounce window still re-arms
        assert_eq!(interp.on_sample(0.0, 600), None);
        assert_eq!(interp.on_sample(1.0, 1100), Some(ResolveAction::Correct));
    }

    #[test]
    fn test_no_rearm_means_no_second_action() {
        let mut interp = armed_interpreter();
        assert_eq!(interp.on_sample(1.0, 0), Some(ResolveAction::Correct));
        // Past the debounce window but never returned to level
        assert_eq!(interp.on_sample(1.0, 1500), None);
        assert_eq!(interp.on_sample(0.9, 3000), None);
        // Level, then tilt: fires again
        assert_eq!(interp.on_sample(0.1, 3100), None);
        assert_eq!(interp.on_sample(0.9, 3200), Some(ResolveAction::Correct));
    }

    #[test]
    fn test_one_motion_crossing_twice_fires_once() {
        let mut interp = armed_interpreter();
        // Tilt up past threshold, dip slightly below it (still not level),
        // and cross again: one physical motion, one action.
        assert_eq!(interp.on_sample(0.9, 0), Some(ResolveAction::Correct));
        assert_eq!(interp.on_sample(0.6, 1200), None);
        assert_eq!(interp.on_sample(0.9, 1400), None);
    }

    #[test]
    fn test_grace_window_drops_samples() {
        let mut interp = GestureInterpreter::new(GestureConfig::default());
        interp.arm(10_000);

        // Inside the 1s grace window nothing is accepted
        assert_eq!(interp.on_sample(1.0, 10_200), None);
        assert_eq!(interp.on_sample(1.0, 10_999), None);
        // First sample past the window fires
        assert_eq!(interp.on_sample(1.0, 11_000), Some(ResolveAction::Correct));
    }

    #[test]
    fn test_arm_resets_state() {
        let mut interp = armed_interpreter();
        assert_eq!(interp.on_sample(1.0, 0), Some(ResolveAction::Correct));
        interp.disarm();
        assert!(!interp.is_armed());
        assert_eq!(interp.on_sample(0.0, 100), None);

        // Re-arming discards the old debounce stamp
        interp.arm(200);
        assert_eq!(interp.on_sample(1.0, 200), Some(ResolveAction::Correct));
    }
}
