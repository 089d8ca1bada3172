// ─────────────────────────────────────────────────────────────────────
// HumanERS — Emotion Normalizer
// ─────────────────────────────────────────────────────────────────────
//! Expression vectors → emotion score.
//!
//! The score weighs negative affect against calm:
//!
//! ```text
//! negative = fearful + surprised + angry + sad_weight * sad
//! calm     = happy + neutral
//! score    = clamp01(fear_gain * negative - calm_offset * calm)
//! ```
//!
//! A vector whose total magnitude is below `min_magnitude` carries no
//! usable signal and scores the fixed `baseline` instead of 0.

use humaners_types::config::EmotionConfig;
use humaners_types::{clamp01, Channel, EmotionVector, HumanersResult, Reading};

use crate::normalizer::{unexpected, NormalizeContext, Normalizer};
use crate::source::RawSignal;

/// Derive the emotion channel scalar from a vector.
pub fn emotion_score(v: &EmotionVector, cfg: &EmotionConfig) -> f64 {
    if v.magnitude() < cfg.min_magnitude {
        return cfg.baseline;
    }
    let negative = v.fearful + v.surprised + v.angry + cfg.sad_weight * v.sad;
    let calm = v.happy + v.neutral;
    clamp01(cfg.fear_gain * negative - cfg.calm_offset * calm)
}

pub struct EmotionNormalizer {
    cfg: EmotionConfig,
}

impl EmotionNormalizer {
    pub fn new(cfg: EmotionConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EmotionConfig {
        &self.cfg
    }

    /// Reading for a vector that replaces the current one outright
    /// (simulation path).
    pub fn from_vector(&self, vector: EmotionVector, now_ms: f64) -> Reading {
        let vector = vector.clamped();
        Reading::emotion(emotion_score(&vector, &self.cfg), vector, now_ms)
    }
}

impl Normalizer for EmotionNormalizer {
    fn channel(&self) -> Channel {
        Channel::Emotion
    }

    fn normalize(&mut self, raw: &RawSignal, ctx: &NormalizeContext<'_>) -> HumanersResult<Reading> {
        match raw {
            RawSignal::Expressions(observed) => {
                let blended = ctx.emotions.blend(&observed.clamped(), self.cfg.detector_blend);
                let score = emotion_score(&blended, &self.cfg);
                log::trace!("emotion score {score:.4} (dominant {:?})", blended.dominant());
                Ok(Reading::emotion(score, blended, ctx.now_ms))
            }
            RawSignal::Intensity(v) => Ok(Reading::new(Channel::Emotion, *v, ctx.now_ms)),
            other => Err(unexpected(Channel::Emotion, other)),
        }
    }

    fn absence_decay(&self) -> f64 {
        self.cfg.absence_decay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EmotionConfig {
        EmotionConfig::default()
    }

    #[test]
    fn test_fearful_scenario_saturates() {
        let v = EmotionVector {
            fearful: 0.8,
            angry: 0.1,
            neutral: 0.1,
            ..EmotionVector::zero()
        };
        // 2.0 * 0.9 - 0.5 * 0.1 = 1.75 → 1.0
        assert_eq!(emotion_score(&v, &cfg()), 1.0);
    }

    #[test]
    fn test_all_zero_forces_baseline() {
        assert!((emotion_score(&EmotionVector::zero(), &cfg()) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_calm_vector_scores_zero() {
        let v = EmotionVector {
            happy: 0.7,
            neutral: 0.3,
            ..EmotionVector::zero()
        };
        assert_eq!(emotion_score(&v, &cfg()), 0.0);
    }

    #[test]
    fn test_sad_counts_at_half_weight() {
        let v = EmotionVector {
            sad: 0.4,
            ..EmotionVector::zero()
        };
        // 2.0 * (0.5 * 0.4) = 0.4
        assert!((emotion_score(&v, &cfg()) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_reset_vector_scores_zero() {
        // neutral 0.5 is above the magnitude threshold: 0 - 0.25 → 0
        assert_eq!(emotion_score(&EmotionVector::default(), &cfg()), 0.0);
    }

    #[test]
    fn test_detector_path_blends() {
        let mut n = EmotionNormalizer::new(cfg());
        let prev = EmotionVector::zero();
        let ctx = NormalizeContext {
            now_ms: 100.0,
            current: 0.2,
            emotions: &prev,
        };
        let observed = EmotionVector {
            fearful: 1.0,
            ..EmotionVector::zero()
        };
        let r = n.normalize(&RawSignal::Expressions(observed), &ctx).unwrap();
        let blended = r.emotions.unwrap();
        assert!((blended.fearful - 0.3).abs() < 1e-12);
        // 2.0 * 0.3 = 0.6
        assert!((r.value - 0.6).abs() < 1e-12);
        assert_eq!(r.timestamp_ms, 100.0);
    }

    #[test]
    fn test_simulation_path_replaces() {
        let n = EmotionNormalizer::new(cfg());
        let v = EmotionVector {
            fearful: 0.5,
            ..EmotionVector::zero()
        };
        let r = n.from_vector(v, 0.0);
        assert_eq!(r.emotions.unwrap().fearful, 0.5);
        assert!((r.value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_hand_signal() {
        let mut n = EmotionNormalizer::new(cfg());
        let v = EmotionVector::default();
        let ctx = NormalizeContext {
            now_ms: 0.0,
            current: 0.2,
            emotions: &v,
        };
        assert!(n.normalize(&RawSignal::Hand(vec![]), &ctx).is_err());
    }
}
