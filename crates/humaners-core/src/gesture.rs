// ─────────────────────────────────────────────────────────────────────
// HumanERS — Gesture Normalizer
// ─────────────────────────────────────────────────────────────────────
//! Hand landmarks → gesture score.
//!
//! Two components, averaged:
//! - **spread**: summed distance between neighbouring fingertips;
//! - **shake**: wrist velocity between consecutive samples.
//!
//! Malformed landmark data zeroes the affected component for that tick.

use humaners_types::config::GestureConfig;
use humaners_types::{clamp01, Channel, HumanersResult, Reading};

use crate::normalizer::{unexpected, NormalizeContext, Normalizer};
use crate::source::RawSignal;

/// Wrist landmark index.
pub const WRIST: usize = 0;
/// Fingertip landmark indices, thumb to little finger.
pub const FINGERTIPS: [usize; 5] = [4, 8, 12, 16, 20];

fn landmark(landmarks: &[[f64; 2]], idx: usize) -> Option<[f64; 2]> {
    landmarks
        .get(idx)
        .copied()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Finger spread in [0, 1]; 0 when any fingertip is missing.
pub fn finger_spread(landmarks: &[[f64; 2]], divisor: f64) -> f64 {
    let mut total = 0.0;
    for pair in FINGERTIPS.windows(2) {
        match (landmark(landmarks, pair[0]), landmark(landmarks, pair[1])) {
            (Some(a), Some(b)) => total += distance(a, b),
            _ => {
                log::debug!("fingertip landmark {} or {} missing", pair[0], pair[1]);
                return 0.0;
            }
        }
    }
    clamp01(total / divisor)
}

#[derive(Debug, Clone, Copy)]
struct WristSample {
    pos: [f64; 2],
    at_ms: f64,
}

pub struct GestureNormalizer {
    cfg: GestureConfig,
    last_wrist: Option<WristSample>,
    last_shake: f64,
}

impl GestureNormalizer {
    pub fn new(cfg: GestureConfig) -> Self {
        Self {
            cfg,
            last_wrist: None,
            last_shake: 0.0,
        }
    }

    /// Wrist velocity in [0, 1].
    ///
    /// The first sample returns 0. Samples arriving sooner than
    /// `min_sample_interval_ms` after the last accepted one return the
    /// previous value without moving the reference point.
    pub fn hand_shake(&mut self, landmarks: &[[f64; 2]], now_ms: f64) -> f64 {
        let Some(wrist) = landmark(landmarks, WRIST) else {
            log::debug!("wrist landmark missing");
            return 0.0;
        };

        let Some(prev) = self.last_wrist else {
            self.last_wrist = Some(WristSample {
                pos: wrist,
                at_ms: now_ms,
            });
            return 0.0;
        };

        let dt = now_ms - prev.at_ms;
        if dt < self.cfg.min_sample_interval_ms {
            return self.last_shake;
        }

        let velocity = distance(wrist, prev.pos) / dt;
        self.last_wrist = Some(WristSample {
            pos: wrist,
            at_ms: now_ms,
        });
        self.last_shake = clamp01(velocity * self.cfg.shake_gain);
        self.last_shake
    }

    pub fn last_shake(&self) -> f64 {
        self.last_shake
    }
}

impl Normalizer for GestureNormalizer {
    fn channel(&self) -> Channel {
        Channel::Gesture
    }

    fn normalize(&mut self, raw: &RawSignal, ctx: &NormalizeContext<'_>) -> HumanersResult<Reading> {
        match raw {
            RawSignal::Hand(landmarks) => {
                let spread = finger_spread(landmarks, self.cfg.spread_divisor);
                let shake = self.hand_shake(landmarks, ctx.now_ms);
                Ok(Reading::new(
                    Channel::Gesture,
                    (spread + shake) / 2.0,
                    ctx.now_ms,
                ))
            }
            RawSignal::Intensity(v) => Ok(Reading::new(Channel::Gesture, *v, ctx.now_ms)),
            other => Err(unexpected(Channel::Gesture, other)),
        }
    }

    fn absence_decay(&self) -> f64 {
        self.cfg.absence_decay
    }

    fn reset(&mut self) {
        self.last_wrist = None;
        self.last_shake = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use humaners_types::EmotionVector;

    use super::*;

    /// 21 landmarks with the wrist at `wrist` and fingertips `gap` px apart.
    fn hand(wrist: [f64; 2], gap: f64) -> Vec<[f64; 2]> {
        let mut pts = vec![[0.0, 0.0]; 21];
        pts[WRIST] = wrist;
        for (i, &tip) in FINGERTIPS.iter().enumerate() {
            pts[tip] = [i as f64 * gap, 0.0];
        }
        pts
    }

    fn ctx(now_ms: f64, emotions: &EmotionVector) -> NormalizeContext<'_> {
        NormalizeContext {
            now_ms,
            current: 0.2,
            emotions,
        }
    }

    #[test]
    fn test_spread_normalized() {
        // 4 gaps of 50 px = 200 / 500 = 0.4
        let s = finger_spread(&hand([0.0, 0.0], 50.0), 500.0);
        assert!((s - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_spread_clamped() {
        let s = finger_spread(&hand([0.0, 0.0], 400.0), 500.0);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_spread_malformed_is_zero() {
        assert_eq!(finger_spread(&[[0.0, 0.0]; 10], 500.0), 0.0);
        let mut pts = hand([0.0, 0.0], 50.0);
        pts[12] = [f64::NAN, 1.0];
        assert_eq!(finger_spread(&pts, 500.0), 0.0);
    }

    #[test]
    fn test_first_shake_sample_is_zero() {
        let mut g = GestureNormalizer::new(GestureConfig::default());
        assert_eq!(g.hand_shake(&hand([0.0, 0.0], 0.0), 0.0), 0.0);
    }

    #[test]
    fn test_shake_velocity() {
        let mut g = GestureNormalizer::new(GestureConfig::default());
        g.hand_shake(&hand([0.0, 0.0], 0.0), 0.0);
        // 5 px in 100 ms = 0.05 px/ms * 10 = 0.5
        let s = g.hand_shake(&hand([3.0, 4.0], 0.0), 100.0);
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_shake_reused_inside_min_interval() {
        let mut g = GestureNormalizer::new(GestureConfig::default());
        g.hand_shake(&hand([0.0, 0.0], 0.0), 0.0);
        let s1 = g.hand_shake(&hand([3.0, 4.0], 0.0), 100.0);
        // 30 ms later a wild jump is ignored
        let s2 = g.hand_shake(&hand([300.0, 400.0], 0.0), 130.0);
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_gesture_is_average() {
        let mut g = GestureNormalizer::new(GestureConfig::default());
        let v = EmotionVector::default();
        let r = g
            .normalize(&RawSignal::Hand(hand([0.0, 0.0], 50.0)), &ctx(0.0, &v))
            .unwrap();
        // spread 0.4, first shake 0
        assert!((r.value - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_same_reading_twice_is_idempotent() {
        let mut g = GestureNormalizer::new(GestureConfig::default());
        let v = EmotionVector::default();
        g.normalize(&RawSignal::Hand(hand([0.0, 0.0], 50.0)), &ctx(0.0, &v))
            .unwrap();
        let raw = RawSignal::Hand(hand([3.0, 4.0], 50.0));
        let a = g.normalize(&raw, &ctx(100.0, &v)).unwrap();
        let b = g.normalize(&raw, &ctx(100.0, &v)).unwrap();
        assert_eq!(a.value, b.value);
    }

    #[test]
    fn test_reset_forgets_wrist() {
        let mut g = GestureNormalizer::new(GestureConfig::default());
        g.hand_shake(&hand([0.0, 0.0], 0.0), 0.0);
        g.hand_shake(&hand([3.0, 4.0], 0.0), 100.0);
        g.reset();
        assert_eq!(g.last_shake(), 0.0);
        assert_eq!(g.hand_shake(&hand([50.0, 50.0], 0.0), 200.0), 0.0);
    }
}
