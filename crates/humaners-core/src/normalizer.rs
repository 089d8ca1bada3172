// ─────────────────────────────────────────────────────────────────────
// HumanERS — Normalizer Interface
// ─────────────────────────────────────────────────────────────────────
//! Per-channel conversion of raw detector output into one bounded scalar.

use humaners_types::{Channel, EmotionVector, HumanersError, HumanersResult, Reading};

use crate::source::RawSignal;

/// Read-only view of the live channel state a normalizer may consult.
///
/// The fusion engine owns this state; normalizers never hold it.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub now_ms: f64,
    /// Current scalar of the channel being normalized.
    pub current: f64,
    pub emotions: &'a EmotionVector,
}

/// Trait for channel normalizers.
pub trait Normalizer: Send {
    fn channel(&self) -> Channel;

    /// Convert a fresh detection into a reading in [0, 1].
    fn normalize(&mut self, raw: &RawSignal, ctx: &NormalizeContext<'_>) -> HumanersResult<Reading>;

    /// Multiplicative decay applied per tick when the detector sees nothing.
    /// `1.0` holds the current value.
    fn absence_decay(&self) -> f64 {
        1.0
    }

    /// Drop any sampling history (wrist positions and the like).
    fn reset(&mut self) {}
}

/// Error for a signal handed to the wrong normalizer.
pub(crate) fn unexpected(channel: Channel, raw: &RawSignal) -> HumanersError {
    HumanersError::MalformedSignal(format!(
        "{channel} normalizer cannot handle {} signal",
        raw.kind()
    ))
}
