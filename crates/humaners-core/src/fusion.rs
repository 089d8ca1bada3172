// ─────────────────────────────────────────────────────────────────────
// HumanERS — Fusion Engine
// ─────────────────────────────────────────────────────────────────────
//! Owner of all live channel state. Combines the four channel scalars into
//! the threat target, smooths the displayed value toward it and decides
//! when a display update is due.

use humaners_types::config::ChannelWeights;
use humaners_types::{
    clamp01, Channel, ChannelMode, ChannelStatus, EmotionVector, FusionConfig, Reading, ThreatBand,
    ThreatSnapshot,
};

use crate::display::ThreatDisplay;
use crate::emotion::emotion_score;
use crate::normalizer::NormalizeContext;

/// Weighted sum of channel scalars, indexed by [`Channel::index`].
///
/// Pure: depends only on its arguments.
#[inline]
pub fn combine(weights: &ChannelWeights, values: &[f64; 4]) -> f64 {
    let w = weights.as_array();
    clamp01(
        w.iter()
            .zip(values.iter())
            .map(|(w, v)| w * clamp01(*v))
            .sum(),
    )
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    value: f64,
    available: bool,
    mode: ChannelMode,
}

pub struct FusionEngine {
    config: FusionConfig,
    channels: [ChannelState; 4],
    emotions: EmotionVector,
    target: f64,
    displayed: f64,
    last_notified: Option<f64>,
    pending: Option<ThreatDisplay>,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        let initial = clamp01(config.initial_level);
        Self {
            channels: [ChannelState {
                value: initial,
                available: true,
                mode: ChannelMode::Detector,
            }; 4],
            emotions: EmotionVector::default(),
            target: initial,
            displayed: initial,
            last_notified: None,
            pending: None,
            config,
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    // ── Channel writes ──────────────────────────────────────────────

    /// Replace a channel scalar with a fresh reading.
    pub fn apply(&mut self, reading: &Reading) {
        let idx = reading.channel.index();
        self.channels[idx].value = clamp01(reading.value);
        if let Some(vector) = reading.emotions {
            self.emotions = vector.clamped();
        }
    }

    /// Set a channel scalar directly.
    pub fn set_value(&mut self, channel: Channel, value: f64) {
        self.channels[channel.index()].value = clamp01(value);
    }

    /// Multiply a channel by `rate`, floored at the decay floor.
    ///
    /// A value under the floor is lifted to it on the first absence tick.
    pub fn decay(&mut self, channel: Channel, rate: f64) {
        let floor = self.config.decay_floor;
        let state = &mut self.channels[channel.index()];
        state.value = clamp01((state.value * rate).max(floor));
    }

    /// Replace the emotion vector and rederive the emotion scalar.
    pub fn set_emotions(&mut self, vector: EmotionVector) {
        self.emotions = vector.clamped();
        self.channels[Channel::Emotion.index()].value =
            emotion_score(&self.emotions, &self.config.emotion);
    }

    pub fn set_available(&mut self, channel: Channel, available: bool) {
        self.channels[channel.index()].available = available;
    }

    /// Simulation mode is terminal; switching back is ignored.
    pub fn set_mode(&mut self, channel: Channel, mode: ChannelMode) {
        let state = &mut self.channels[channel.index()];
        if state.mode == ChannelMode::Simulation {
            return;
        }
        state.mode = mode;
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn value(&self, channel: Channel) -> f64 {
        self.channels[channel.index()].value
    }

    pub fn values(&self) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (o, s) in out.iter_mut().zip(self.channels.iter()) {
            *o = s.value;
        }
        out
    }

    pub fn mode(&self, channel: Channel) -> ChannelMode {
        self.channels[channel.index()].mode
    }

    pub fn is_available(&self, channel: Channel) -> bool {
        self.channels[channel.index()].available
    }

    pub fn emotions(&self) -> &EmotionVector {
        &self.emotions
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    pub fn band(&self) -> ThreatBand {
        ThreatBand::from_score(self.displayed)
    }

    /// Context handed to a channel's normalizer.
    pub fn context(&self, channel: Channel, now_ms: f64) -> NormalizeContext<'_> {
        NormalizeContext {
            now_ms,
            current: self.value(channel),
            emotions: &self.emotions,
        }
    }

    // ── Loops ───────────────────────────────────────────────────────

    /// Assessment tick: recompute the target and queue a display update if
    /// the displayed value moved past the hysteresis threshold.
    pub fn assess(&mut self) -> f64 {
        self.target = combine(&self.config.weights, &self.values());

        let due = match self.last_notified {
            None => true,
            Some(last) => (self.displayed - last).abs() > self.config.display_hysteresis,
        };
        if due {
            self.last_notified = Some(self.displayed);
            self.pending = Some(ThreatDisplay::from_score(self.displayed));
            log::debug!(
                "threat target {:.4} displayed {:.4} ({})",
                self.target,
                self.displayed,
                self.band().label()
            );
        }
        self.target
    }

    /// Animation tick: move `displayed` a fraction α toward `target`.
    pub fn animate(&mut self) -> f64 {
        self.displayed =
            clamp01(self.displayed + (self.target - self.displayed) * self.config.smoothing_alpha);
        self.displayed
    }

    pub fn take_display_update(&mut self) -> Option<ThreatDisplay> {
        self.pending.take()
    }

    pub fn statuses(&self) -> Vec<ChannelStatus> {
        Channel::ALL
            .iter()
            .map(|&channel| {
                let s = self.channels[channel.index()];
                ChannelStatus {
                    channel,
                    value: s.value,
                    available: s.available,
                    mode: s.mode,
                }
            })
            .collect()
    }

    pub fn snapshot(&self, paused: bool) -> ThreatSnapshot {
        ThreatSnapshot {
            target: self.target,
            displayed: self.displayed,
            band: self.band(),
            channels: self.statuses(),
            emotions: self.emotions,
            emotion_percentages: self.emotions.percentages(),
            dominant_emotion: self.emotions.dominant(),
            paused,
        }
    }

    /// Back to start-of-session values. Availability and mode are kept.
    pub fn reset(&mut self) {
        let initial = clamp01(self.config.initial_level);
        for s in self.channels.iter_mut() {
            s.value = initial;
        }
        self.emotions = EmotionVector::default();
        self.target = initial;
        self.displayed = initial;
        self.last_notified = None;
        self.pending = None;
    }
}
