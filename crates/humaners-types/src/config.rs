// ─────────────────────────────────────────────────────────────────────
// HumanERS — Threat Fusion Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{HumanersError, HumanersResult};

/// Fixed combination weights; must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelWeights {
    pub emotion: f64,
    pub gesture: f64,
    pub eye: f64,
    pub motion: f64,
}

impl ChannelWeights {
    pub const DEFAULT: ChannelWeights = ChannelWeights {
        emotion: 0.5,
        gesture: 0.4,
        eye: 0.05,
        motion: 0.05,
    };

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Emotion => self.emotion,
            Channel::Gesture => self.gesture,
            Channel::Eye => self.eye,
            Channel::Motion => self.motion,
        }
    }

    pub fn sum(&self) -> f64 {
        self.emotion + self.gesture + self.eye + self.motion
    }

    /// Weights in [`Channel::index`] order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.emotion, self.gesture, self.eye, self.motion]
    }
}

impl Default for ChannelWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Emotion normalizer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionConfig {
    /// Blend factor toward a fresh detector vector.
    /// Default: 0.3.
    pub detector_blend: f64,
    /// Gain on negative affect (fearful + surprised + angry + sad_weight·sad).
    /// Default: 2.0.
    pub fear_gain: f64,
    /// Contribution of sadness to negative affect.
    /// Default: 0.5.
    pub sad_weight: f64,
    /// Calm offset subtracted per unit of happy + neutral.
    /// Default: 0.5.
    pub calm_offset: f64,
    /// Score forced when the vector's total magnitude is below `min_magnitude`.
    /// Default: 0.1.
    pub baseline: f64,
    /// Default: 0.1.
    pub min_magnitude: f64,
    /// Multiplicative decay per tick without a face.
    /// Default: 0.98.
    pub absence_decay: f64,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            detector_blend: 0.3,
            fear_gain: 2.0,
            sad_weight: 0.5,
            calm_offset: 0.5,
            baseline: 0.1,
            min_magnitude: 0.1,
            absence_decay: 0.98,
        }
    }
}

/// Gesture normalizer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Empirical divisor for summed fingertip distances (pixels).
    /// Default: 500.
    pub spread_divisor: f64,
    /// Wrist velocity (px/ms) multiplier.
    /// Default: 10.
    pub shake_gain: f64,
    /// Samples closer than this reuse the previous shake value.
    /// Default: 50 ms.
    pub min_sample_interval_ms: f64,
    /// Multiplicative decay per tick without a hand.
    /// Default: 0.95.
    pub absence_decay: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            spread_divisor: 500.0,
            shake_gain: 10.0,
            min_sample_interval_ms: 50.0,
            absence_decay: 0.95,
        }
    }
}

/// Gaze normalizer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Normalized radial distances below this score 0.
    /// Default: 0.1.
    pub dead_zone: f64,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self { dead_zone: 0.1 }
    }
}

/// Motion normalizer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Acceleration magnitude (m/s², gravity included) that must be exceeded.
    /// Default: 15.
    pub noise_floor: f64,
    /// Default: 20.
    pub scale: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            noise_floor: 15.0,
            scale: 20.0,
        }
    }
}

/// Detector failure handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Consecutive failures before permanent simulation mode.
    /// Default: 10.
    pub max_errors: u32,
    /// Detector load attempts before giving up.
    /// Default: 3.
    pub load_attempts: u32,
    /// Deadline per load attempt.
    /// Default: 10000 ms.
    pub load_timeout_ms: u64,
    /// Linear backoff unit between load attempts.
    /// Default: 250 ms.
    pub load_backoff_ms: u64,
    /// Per-frame detector calls slower than this count as a timeout.
    /// Default: 150 ms.
    pub detect_deadline_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_errors: 10,
            load_attempts: 3,
            load_timeout_ms: 10_000,
            load_backoff_ms: 250,
            detect_deadline_ms: 150,
        }
    }
}

/// Loop cadences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Threat re-weighting cadence.
    /// Default: 100 ms.
    pub assess_interval_ms: f64,
    /// Detector polling cadence for each channel.
    /// Default: 100 ms.
    pub detect_interval_ms: f64,
    /// Emotion simulation cadence.
    /// Default: 1000 ms.
    pub emotion_simulation_interval_ms: f64,
    /// Gesture simulation cadence.
    /// Default: 100 ms.
    pub gesture_simulation_interval_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            assess_interval_ms: 100.0,
            detect_interval_ms: 100.0,
            emotion_simulation_interval_ms: 1000.0,
            gesture_simulation_interval_ms: 100.0,
        }
    }
}

/// Simulation generator parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Rolling audio level history length.
    /// Default: 8.
    pub audio_history: usize,
    /// Jump above the rolling mean that counts as a sudden sound.
    /// Default: 0.15.
    pub sudden_threshold: f64,
    /// Half-width of the uniform jitter applied to neutral.
    /// Default: 0.05.
    pub jitter: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            audio_history: 8,
            sudden_threshold: 0.15,
            jitter: 0.05,
        }
    }
}

/// Cosmetic particle and touch-point parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    /// Default: 200.
    pub max_particles: usize,
    /// Spawn probability per frame is `displayed * spawn_rate`.
    /// Default: 0.1.
    pub spawn_rate: f64,
    /// Default: 0.02.
    pub touch_decay: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            max_particles: 200,
            spawn_rate: 0.1,
            touch_decay: 0.02,
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Runtime configuration for the threat fusion kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub weights: ChannelWeights,

    /// First-order low-pass factor applied per animation tick.
    /// Default: 0.1.
    pub smoothing_alpha: f64,

    /// Minimum change in the displayed score before the sink is notified.
    /// Default: 0.05.
    pub display_hysteresis: f64,

    /// Lowest value a decaying channel reaches.
    /// Default: 0.1.
    pub decay_floor: f64,

    /// Channel scalars and threat level at start and after reset.
    /// Default: 0.2.
    pub initial_level: f64,

    pub emotion: EmotionConfig,
    pub gesture: GestureConfig,
    pub gaze: GazeConfig,
    pub motion: MotionConfig,
    pub fallback: FallbackConfig,
    pub timing: TimingConfig,
    pub simulation: SimulationConfig,
    pub visuals: VisualConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: ChannelWeights::DEFAULT,
            smoothing_alpha: 0.1,
            display_hysteresis: 0.05,
            decay_floor: 0.1,
            initial_level: 0.2,
            emotion: EmotionConfig::default(),
            gesture: GestureConfig::default(),
            gaze: GazeConfig::default(),
            motion: MotionConfig::default(),
            fallback: FallbackConfig::default(),
            timing: TimingConfig::default(),
            simulation: SimulationConfig::default(),
            visuals: VisualConfig::default(),
        }
    }
}

fn unit_range(name: &str, value: f64) -> HumanersResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(HumanersError::Config(format!(
            "{name} must be in [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> HumanersResult<()> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(HumanersError::Config(format!(
            "{name} must be > 0, got {value}"
        )));
    }
    Ok(())
}

impl FusionConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> HumanersResult<()> {
        for channel in Channel::ALL {
            unit_range(&format!("weights.{channel}"), self.weights.get(channel))?;
        }
        if (self.weights.sum() - 1.0).abs() > 1e-9 {
            return Err(HumanersError::Config(format!(
                "channel weights must sum to 1.0, got {}",
                self.weights.sum()
            )));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(HumanersError::Config(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        unit_range("display_hysteresis", self.display_hysteresis)?;
        unit_range("decay_floor", self.decay_floor)?;
        unit_range("initial_level", self.initial_level)?;

        unit_range("emotion.detector_blend", self.emotion.detector_blend)?;
        unit_range("emotion.baseline", self.emotion.baseline)?;
        unit_range("emotion.absence_decay", self.emotion.absence_decay)?;
        positive("emotion.fear_gain", self.emotion.fear_gain)?;

        positive("gesture.spread_divisor", self.gesture.spread_divisor)?;
        positive("gesture.shake_gain", self.gesture.shake_gain)?;
        unit_range("gesture.absence_decay", self.gesture.absence_decay)?;

        unit_range("gaze.dead_zone", self.gaze.dead_zone)?;
        positive("motion.scale", self.motion.scale)?;

        if self.fallback.max_errors == 0 {
            return Err(HumanersError::Config(
                "fallback.max_errors must be >= 1".to_string(),
            ));
        }
        if self.fallback.load_attempts == 0 {
            return Err(HumanersError::Config(
                "fallback.load_attempts must be >= 1".to_string(),
            ));
        }
        if self.fallback.detect_deadline_ms == 0 || self.fallback.load_timeout_ms == 0 {
            return Err(HumanersError::Config(
                "fallback deadlines must be > 0".to_string(),
            ));
        }

        positive("timing.assess_interval_ms", self.timing.assess_interval_ms)?;
        positive("timing.detect_interval_ms", self.timing.detect_interval_ms)?;
        positive(
            "timing.emotion_simulation_interval_ms",
            self.timing.emotion_simulation_interval_ms,
        )?;
        positive(
            "timing.gesture_simulation_interval_ms",
            self.timing.gesture_simulation_interval_ms,
        )?;

        if self.simulation.audio_history < 2 {
            return Err(HumanersError::Config(format!(
                "simulation.audio_history must be >= 2, got {}",
                self.simulation.audio_history
            )));
        }
        unit_range("visuals.spawn_rate", self.visuals.spawn_rate)?;
        unit_range("visuals.touch_decay", self.visuals.touch_decay)?;
        Ok(())
    }

    /// Load from JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> HumanersResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| HumanersError::Config(format!("JSON parse error: {e}")))
    }

    pub fn to_json(&self) -> HumanersResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| HumanersError::Config(format!("JSON encode error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        FusionConfig::default().validate().unwrap();
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ChannelWeights::DEFAULT.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_unbalanced_weights() {
        let mut cfg = FusionConfig::default();
        cfg.weights.eye = 0.2;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_rejects_zero_alpha() {
        let mut cfg = FusionConfig::default();
        cfg.smoothing_alpha = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_max_errors() {
        let mut cfg = FusionConfig::default();
        cfg.fallback.max_errors = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let cfg = FusionConfig::from_json(r#"{"smoothing_alpha": 0.2, "fallback": {"max_errors": 3}}"#)
            .unwrap();
        assert_eq!(cfg.smoothing_alpha, 0.2);
        assert_eq!(cfg.fallback.max_errors, 3);
        assert_eq!(cfg.fallback.load_attempts, 3);
        assert_eq!(cfg.weights, ChannelWeights::DEFAULT);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = FusionConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, HumanersError::Config(_)));
    }

    #[test]
    fn test_json_roundtrip_preserves_weights() {
        let json = FusionConfig::default().to_json().unwrap();
        let back = FusionConfig::from_json(&json).unwrap();
        assert_eq!(back.weights, ChannelWeights::DEFAULT);
    }
}
