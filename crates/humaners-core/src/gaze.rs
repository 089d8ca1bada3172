// ─────────────────────────────────────────────────────────────────────
// HumanERS — Gaze Normalizer
// ─────────────────────────────────────────────────────────────────────
//! Gaze point → eye score: radial distance of the normalized gaze point
//! from the display center, 0 at the center and 1 at a corner.

use std::f64::consts::FRAC_1_SQRT_2;

use humaners_types::config::GazeConfig;
use humaners_types::{clamp01, Channel, HumanersError, HumanersResult, Reading};

use crate::normalizer::{unexpected, NormalizeContext, Normalizer};
use crate::source::RawSignal;

/// Eye score for a gaze point given in display pixels.
pub fn gaze_score(x: f64, y: f64, width: f64, height: f64, dead_zone: f64) -> HumanersResult<f64> {
    if !(width > 0.0 && height > 0.0) {
        return Err(HumanersError::MalformedSignal(format!(
            "display size must be positive, got {width}x{height}"
        )));
    }
    let nx = clamp01(x / width) - 0.5;
    let ny = clamp01(y / height) - 0.5;
    let r = (nx * nx + ny * ny).sqrt() / FRAC_1_SQRT_2;
    if r < dead_zone {
        return Ok(0.0);
    }
    Ok(clamp01(r))
}

pub struct GazeNormalizer {
    cfg: GazeConfig,
}

impl GazeNormalizer {
    pub fn new(cfg: GazeConfig) -> Self {
        Self { cfg }
    }
}

impl Normalizer for GazeNormalizer {
    fn channel(&self) -> Channel {
        Channel::Eye
    }

    fn normalize(&mut self, raw: &RawSignal, ctx: &NormalizeContext<'_>) -> HumanersResult<Reading> {
        match *raw {
            RawSignal::Gaze {
                x,
                y,
                width,
                height,
            } => {
                let score = gaze_score(x, y, width, height, self.cfg.dead_zone)?;
                Ok(Reading::new(Channel::Eye, score, ctx.now_ms))
            }
            RawSignal::Intensity(v) => Ok(Reading::new(Channel::Eye, v, ctx.now_ms)),
            ref other => Err(unexpected(Channel::Eye, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_zero() {
        assert_eq!(gaze_score(640.0, 360.0, 1280.0, 720.0, 0.1).unwrap(), 0.0);
    }

    #[test]
    fn test_corner_is_one() {
        let s = gaze_score(0.0, 0.0, 1280.0, 720.0, 0.1).unwrap();
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dead_zone() {
        // 5% right of center: r = 0.05 / 0.7071 ≈ 0.0707 < 0.1
        assert_eq!(gaze_score(704.0, 360.0, 1280.0, 720.0, 0.1).unwrap(), 0.0);
    }

    #[test]
    fn test_edge_midpoint() {
        // right edge, vertical center: r = 0.5 / 0.7071 ≈ 0.7071
        let s = gaze_score(1280.0, 360.0, 1280.0, 720.0, 0.1).unwrap();
        assert!((s - FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_offscreen_is_clamped() {
        let s = gaze_score(-5000.0, 9000.0, 1280.0, 720.0, 0.1).unwrap();
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_display_rejected() {
        assert!(gaze_score(1.0, 1.0, 0.0, 720.0, 0.1).is_err());
    }
}
