// ─────────────────────────────────────────────────────────────────────
// HumanERS — Channel Health (Detector Fallback)
// ─────────────────────────────────────────────────────────────────────
//! Per-channel failure accounting.
//!
//! # Invariants
//!
//! 1. **Demotion is permanent**: once `mode` becomes `Simulation` nothing
//!    moves it back for the rest of the session, successes included.
//! 2. **Only consecutive failures count**: a success resets the counter.
//! 3. **Exactly `max_errors` failures demote**: the failure that brings the
//!    counter to `max_errors` is the one that flips the mode.

use humaners_types::{Channel, ChannelMode, HumanersError};

#[derive(Debug, Clone)]
pub struct ChannelHealth {
    channel: Channel,
    mode: ChannelMode,
    consecutive_errors: u32,
    max_errors: u32,
    last_error: Option<HumanersError>,
}

impl ChannelHealth {
    pub fn new(channel: Channel, max_errors: u32) -> Self {
        Self {
            channel,
            mode: ChannelMode::Detector,
            consecutive_errors: 0,
            max_errors: max_errors.max(1),
            last_error: None,
        }
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    pub fn is_simulated(&self) -> bool {
        self.mode == ChannelMode::Simulation
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn last_error(&self) -> Option<&HumanersError> {
        self.last_error.as_ref()
    }

    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
    }

    /// Count a failure. Returns `true` if this call demoted the channel.
    pub fn record_failure(&mut self, err: HumanersError) -> bool {
        if self.is_simulated() {
            self.last_error = Some(err);
            return false;
        }
        self.consecutive_errors += 1;
        log::warn!(
            "{} detector error {}/{}: {err}",
            self.channel,
            self.consecutive_errors,
            self.max_errors
        );
        self.last_error = Some(err);
        if self.consecutive_errors >= self.max_errors {
            self.demote("persistent detector errors");
            return true;
        }
        false
    }

    /// Switch to simulation immediately (detector absent or failed to load).
    pub fn mark_unavailable(&mut self, err: HumanersError) {
        self.last_error = Some(err);
        self.demote("detector unavailable");
    }

    fn demote(&mut self, why: &str) {
        if self.is_simulated() {
            return;
        }
        self.mode = ChannelMode::Simulation;
        log::error!(
            ">>> {} channel switched to simulation ({why}) <<<",
            self.channel
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err() -> HumanersError {
        HumanersError::Detection("frame dropped".into())
    }

    #[test]
    fn test_starts_on_detector() {
        let h = ChannelHealth::new(Channel::Emotion, 10);
        assert_eq!(h.mode(), ChannelMode::Detector);
        assert_eq!(h.consecutive_errors(), 0);
    }

    #[test]
    fn test_demotes_after_exactly_max_errors() {
        let mut h = ChannelHealth::new(Channel::Gesture, 10);
        for _ in 0..9 {
            assert!(!h.record_failure(err()));
        }
        assert_eq!(h.mode(), ChannelMode::Detector);
        assert!(h.record_failure(err()));
        assert_eq!(h.mode(), ChannelMode::Simulation);
    }

    #[test]
    fn test_success_resets_counter() {
        let mut h = ChannelHealth::new(Channel::Gesture, 3);
        h.record_failure(err());
        h.record_failure(err());
        h.record_success();
        h.record_failure(err());
        h.record_failure(err());
        assert_eq!(h.mode(), ChannelMode::Detector);
    }

    #[test]
    fn test_no_recovery_after_demotion() {
        let mut h = ChannelHealth::new(Channel::Emotion, 2);
        h.record_failure(err());
        h.record_failure(err());
        for _ in 0..100 {
            h.record_success();
        }
        assert!(h.is_simulated());
    }

    #[test]
    fn test_unavailable_is_immediate() {
        let mut h = ChannelHealth::new(Channel::Eye, 10);
        h.mark_unavailable(HumanersError::Unavailable("no gaze tracker".into()));
        assert!(h.is_simulated());
        assert!(matches!(h.last_error(), Some(HumanersError::Unavailable(_))));
    }
}
