// ─────────────────────────────────────────────────────────────────────
// HumanERS — Motion Normalizer
// ─────────────────────────────────────────────────────────────────────

use humaners_types::config::MotionConfig;
use humaners_types::{clamp01, Channel, HumanersResult, Reading};

use crate::normalizer::{unexpected, NormalizeContext, Normalizer};
use crate::source::RawSignal;

/// Magnitude of an acceleration triple; non-finite components read as 0.
pub fn acceleration_magnitude(x: f64, y: f64, z: f64) -> f64 {
    let f = |v: f64| if v.is_finite() { v } else { 0.0 };
    (f(x).powi(2) + f(y).powi(2) + f(z).powi(2)).sqrt()
}

/// Accelerometer → motion score.
///
/// Readings at or below the noise floor keep the previous value; above it
/// the score becomes `min(1, magnitude / scale)`.
pub struct MotionNormalizer {
    cfg: MotionConfig,
}

impl MotionNormalizer {
    pub fn new(cfg: MotionConfig) -> Self {
        Self { cfg }
    }

    pub fn score(&self, magnitude: f64, current: f64) -> f64 {
        if magnitude > self.cfg.noise_floor {
            clamp01(magnitude / self.cfg.scale)
        } else {
            current
        }
    }
}

impl Normalizer for MotionNormalizer {
    fn channel(&self) -> Channel {
        Channel::Motion
    }

    fn normalize(&mut self, raw: &RawSignal, ctx: &NormalizeContext<'_>) -> HumanersResult<Reading> {
        match *raw {
            RawSignal::Acceleration { x, y, z } => {
                let magnitude = acceleration_magnitude(x, y, z);
                Ok(Reading::new(
                    Channel::Motion,
                    self.score(magnitude, ctx.current),
                    ctx.now_ms,
                ))
            }
            RawSignal::Intensity(v) => Ok(Reading::new(Channel::Motion, v, ctx.now_ms)),
            ref other => Err(unexpected(Channel::Motion, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use humaners_types::EmotionVector;

    use super::*;

    fn normalize(x: f64, y: f64, z: f64, current: f64) -> f64 {
        let mut n = MotionNormalizer::new(MotionConfig::default());
        let v = EmotionVector::default();
        let ctx = NormalizeContext {
            now_ms: 0.0,
            current,
            emotions: &v,
        };
        n.normalize(&RawSignal::Acceleration { x, y, z }, &ctx)
            .unwrap()
            .value
    }

    #[test]
    fn test_gravity_only_keeps_current() {
        assert_eq!(normalize(0.0, 0.0, 9.81, 0.2), 0.2);
    }

    #[test]
    fn test_above_floor_scales() {
        // magnitude 16 → 16 / 20 = 0.8
        assert!((normalize(0.0, 0.0, 16.0, 0.2) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_strong_shake_clamps() {
        assert_eq!(normalize(30.0, 30.0, 9.81, 0.2), 1.0);
    }

    #[test]
    fn test_non_finite_components_ignored() {
        assert_eq!(acceleration_magnitude(f64::NAN, 3.0, 4.0), 5.0);
    }
}
