// ─────────────────────────────────────────────────────────────────────
// HumanERS — Channel and Emotion Types
// ─────────────────────────────────────────────────────────────────────
//! The four signal channels and the emotion vector carried by the
//! emotion channel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::score::clamp_score;

/// One of the four independent signal categories feeding the threat score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Emotion,
    Gesture,
    Eye,
    Motion,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Emotion,
        Channel::Gesture,
        Channel::Eye,
        Channel::Motion,
    ];

    /// Dense index into per-channel arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Emotion => 0,
            Channel::Gesture => 1,
            Channel::Eye => 2,
            Channel::Motion => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Emotion => "emotion",
            Channel::Gesture => "gesture",
            Channel::Eye => "eye",
            Channel::Motion => "motion",
        }
    }

    /// Case-insensitive lookup by [`Channel::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Channel::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// Human-readable feature name used in status listings.
    pub fn feature_name(self) -> &'static str {
        match self {
            Channel::Emotion => "Emotion Detection",
            Channel::Gesture => "Gesture Recognition",
            Channel::Eye => "Eye Tracking",
            Channel::Motion => "Motion Detection",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a channel's values currently come from.
///
/// `Simulation` is terminal for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    Detector,
    Simulation,
}

/// Named emotion categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Fearful,
    Surprised,
    Neutral,
    Disgusted,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Surprised,
        Emotion::Neutral,
        Emotion::Disgusted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
            Emotion::Disgusted => "disgusted",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }
}

/// Intensity per emotion category, each in [0, 1].
///
/// Intensities are independent and need not sum to 1. The default is the
/// reset vector: everything 0 except `neutral = 0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    pub happy: f64,
    pub sad: f64,
    pub angry: f64,
    pub fearful: f64,
    pub surprised: f64,
    pub neutral: f64,
    pub disgusted: f64,
}

impl Default for EmotionVector {
    fn default() -> Self {
        Self {
            neutral: 0.5,
            ..Self::zero()
        }
    }
}

impl EmotionVector {
    /// All categories at 0.
    pub const fn zero() -> Self {
        Self {
            happy: 0.0,
            sad: 0.0,
            angry: 0.0,
            fearful: 0.0,
            surprised: 0.0,
            neutral: 0.0,
            disgusted: 0.0,
        }
    }

    /// Build from a detector's expression map. Unknown names are ignored,
    /// missing categories read as 0, every value is clamped.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut v = Self::zero();
        for (name, value) in pairs {
            match Emotion::from_name(name) {
                Some(e) => v.set(e, value),
                None => log::debug!("ignoring unknown expression '{name}'"),
            }
        }
        v
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Happy => self.happy,
            Emotion::Sad => self.sad,
            Emotion::Angry => self.angry,
            Emotion::Fearful => self.fearful,
            Emotion::Surprised => self.surprised,
            Emotion::Neutral => self.neutral,
            Emotion::Disgusted => self.disgusted,
        }
    }

    /// Set one category, clamped to [0, 1].
    pub fn set(&mut self, emotion: Emotion, value: f64) {
        let value = clamp_score(value, 0.0, 1.0);
        match emotion {
            Emotion::Happy => self.happy = value,
            Emotion::Sad => self.sad = value,
            Emotion::Angry => self.angry = value,
            Emotion::Fearful => self.fearful = value,
            Emotion::Surprised => self.surprised = value,
            Emotion::Neutral => self.neutral = value,
            Emotion::Disgusted => self.disgusted = value,
        }
    }

    /// Re-clamp every category (after deserialization, for instance).
    pub fn clamped(mut self) -> Self {
        for e in Emotion::ALL {
            self.set(e, self.get(e));
        }
        self
    }

    /// Sum of all category intensities.
    pub fn magnitude(&self) -> f64 {
        Emotion::ALL.iter().map(|&e| self.get(e)).sum()
    }

    /// Exponential blend toward `observed`: `self + (observed - self) * factor`.
    pub fn blend(&self, observed: &EmotionVector, factor: f64) -> EmotionVector {
        let mut out = *self;
        for e in Emotion::ALL {
            let prev = self.get(e);
            out.set(e, prev + (observed.get(e) - prev) * factor);
        }
        out
    }

    /// Strongest category; ties resolve to the earlier category in
    /// [`Emotion::ALL`], and an all-zero vector reads as neutral.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::Neutral;
        let mut best_value = 0.0;
        for e in Emotion::ALL {
            let v = self.get(e);
            if v > best_value {
                best = e;
                best_value = v;
            }
        }
        best
    }

    /// Per-category percentages (0–100), rounded to whole numbers.
    pub fn percentages(&self) -> Vec<(Emotion, u8)> {
        Emotion::ALL
            .iter()
            .map(|&e| (e, (self.get(e) * 100.0).round() as u8))
            .collect()
    }
}
