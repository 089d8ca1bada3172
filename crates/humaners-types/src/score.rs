// ─────────────────────────────────────────────────────────────────────
// HumanERS — Threat Score Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelMode, Emotion, EmotionVector};

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Shorthand for `clamp_score(value, 0.0, 1.0)`.
#[inline]
pub fn clamp01(value: f64) -> f64 {
    clamp_score(value, 0.0, 1.0)
}

/// A normalized, timestamped channel value.
///
/// Emotion readings also carry the vector the score was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub channel: Channel,
    /// Normalized value in [0, 1].
    pub value: f64,
    pub emotions: Option<EmotionVector>,
    /// Monotonic milliseconds since session start.
    pub timestamp_ms: f64,
}

impl Reading {
    pub fn new(channel: Channel, value: f64, timestamp_ms: f64) -> Self {
        Self {
            channel,
            value: clamp01(value),
            emotions: None,
            timestamp_ms,
        }
    }

    pub fn emotion(score: f64, emotions: EmotionVector, timestamp_ms: f64) -> Self {
        Self {
            channel: Channel::Emotion,
            value: clamp01(score),
            emotions: Some(emotions),
            timestamp_ms,
        }
    }
}

/// Number of discrete display bands.
pub const BAND_COUNT: usize = 5;

/// Discrete threat level for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatBand {
    Safe,
    Low,
    Moderate,
    High,
    Danger,
}

impl ThreatBand {
    pub const ALL: [ThreatBand; BAND_COUNT] = [
        ThreatBand::Safe,
        ThreatBand::Low,
        ThreatBand::Moderate,
        ThreatBand::High,
        ThreatBand::Danger,
    ];

    /// `floor(score * 5)` clamped to [0, 4].
    pub fn from_score(score: f64) -> Self {
        let level = (clamp01(score) * BAND_COUNT as f64).floor() as usize;
        Self::ALL[level.min(BAND_COUNT - 1)]
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            ThreatBand::Safe => "Safe",
            ThreatBand::Low => "Low",
            ThreatBand::Moderate => "Moderate",
            ThreatBand::High => "High",
            ThreatBand::Danger => "Maximum",
        }
    }

    pub fn symbols(self) -> &'static [&'static str] {
        match self {
            ThreatBand::Safe => &["✨", "🏔️", "😊", "💤"],
            ThreatBand::Low => &["🌊", "🏔️", "👁️"],
            ThreatBand::Moderate => &["👁️", "🌀", "⭕"],
            ThreatBand::High => &["⚠️", "🌊", "🔥"],
            ThreatBand::Danger => &["💀", "👁️", "⚠️", "🌪️"],
        }
    }

    /// Gradient colors; the first two are the inner and outer stops.
    pub fn colors(self) -> &'static [&'static str; 3] {
        match self {
            ThreatBand::Safe => &["#00ff88", "#ffffff", "#88ffaa"],
            ThreatBand::Low => &["#0088ff", "#00ff88", "#44aaff"],
            ThreatBand::Moderate => &["#ffff00", "#ff8800", "#ffaa44"],
            ThreatBand::High => &["#ff8800", "#ff0000", "#ff6600"],
            ThreatBand::Danger => &["#ff0000", "#000000", "#660000"],
        }
    }

    /// Deterministic symbol for `score`: `floor(score * len) % len`.
    pub fn symbol_for(self, score: f64) -> &'static str {
        let set = self.symbols();
        let idx = (clamp01(score) * set.len() as f64).floor() as usize % set.len();
        set[idx]
    }
}

/// Status indicator for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub channel: Channel,
    pub value: f64,
    pub available: bool,
    pub mode: ChannelMode,
}

impl ChannelStatus {
    /// Short status text: "active", "fallback" or "offline".
    pub fn label(&self) -> &'static str {
        match (self.available, self.mode) {
            (true, ChannelMode::Detector) => "active",
            (_, ChannelMode::Simulation) => "fallback",
            (false, ChannelMode::Detector) => "offline",
        }
    }
}

/// Read-only view of the fusion state handed to display sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatSnapshot {
    pub target: f64,
    pub displayed: f64,
    pub band: ThreatBand,
    pub channels: Vec<ChannelStatus>,
    pub emotions: EmotionVector,
    pub emotion_percentages: Vec<(Emotion, u8)>,
    pub dominant_emotion: Emotion,
    pub paused: bool,
}

impl ThreatSnapshot {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelStatus> {
        self.channels.iter().find(|s| s.channel == channel)
    }

    /// "Active" when the gesture channel exceeds 0.5, otherwise "Calm".
    pub fn gesture_label(&self) -> &'static str {
        match self.channel(Channel::Gesture) {
            Some(s) if s.value > 0.5 => "Active",
            _ => "Calm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_score(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_pos_inf() {
        assert_eq!(clamp_score(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_neg_inf() {
        assert_eq!(clamp_score(f64::NEG_INFINITY, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp01(0.75), 0.75);
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(-0.3), 0.0);
    }

    #[test]
    fn test_reading_clamps() {
        let r = Reading::new(Channel::Motion, 3.0, 0.0);
        assert_eq!(r.value, 1.0);
        let r = Reading::new(Channel::Eye, f64::NAN, 0.0);
        assert_eq!(r.value, 0.0);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ThreatBand::from_score(0.39999), ThreatBand::Low);
        assert_eq!(ThreatBand::from_score(0.4), ThreatBand::Moderate);
        assert_eq!(ThreatBand::from_score(0.0), ThreatBand::Safe);
        assert_eq!(ThreatBand::from_score(1.0), ThreatBand::Danger);
        assert_eq!(ThreatBand::from_score(0.8), ThreatBand::Danger);
    }

    #[test]
    fn test_symbol_is_deterministic() {
        // Moderate has 3 symbols: floor(0.5 * 3) % 3 = 1
        assert_eq!(ThreatBand::Moderate.symbol_for(0.5), "🌀");
        assert_eq!(
            ThreatBand::Moderate.symbol_for(0.5),
            ThreatBand::Moderate.symbol_for(0.5)
        );
        // Danger at 1.0: floor(1.0 * 4) % 4 = 0
        assert_eq!(ThreatBand::Danger.symbol_for(1.0), "💀");
    }

    #[test]
    fn test_status_labels() {
        let mut s = ChannelStatus {
            channel: Channel::Eye,
            value: 0.2,
            available: true,
            mode: ChannelMode::Detector,
        };
        assert_eq!(s.label(), "active");
        s.available = false;
        assert_eq!(s.label(), "offline");
        s.mode = ChannelMode::Simulation;
        assert_eq!(s.label(), "fallback");
    }
}
