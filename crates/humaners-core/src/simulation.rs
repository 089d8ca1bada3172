// ─────────────────────────────────────────────────────────────────────
// HumanERS — Simulation Fallback Generator
// ─────────────────────────────────────────────────────────────────────
//! Synthetic channel values for channels running without a detector.
//!
//! Drivers are the low-level inputs that stay available without any model:
//! pointer/touch activity and pressure, microphone level and the motion
//! scalar. Every output passes the same clamps as detector output so the
//! fusion engine cannot tell the two apart.

use std::collections::VecDeque;

use rand::Rng;

use humaners_types::config::SimulationConfig;
use humaners_types::{clamp01, EmotionVector};

/// RMS level in [0, 1] of analyser frequency bins (bytes 0–255).
pub fn audio_rms(bins: &[u8]) -> f64 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = bins
        .iter()
        .map(|&b| {
            let v = b as f64 / 255.0;
            v * v
        })
        .sum();
    clamp01((sum_sq / bins.len() as f64).sqrt())
}

/// Rolling microphone level with sudden-change detection.
#[derive(Debug, Clone)]
pub struct AudioMeter {
    history: VecDeque<f64>,
    capacity: usize,
    sudden_threshold: f64,
    level: f64,
    sudden: bool,
}

impl AudioMeter {
    pub fn new(capacity: usize, sudden_threshold: f64) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
            sudden_threshold,
            level: 0.0,
            sudden: false,
        }
    }

    /// Record a new level. A level that exceeds the mean of the previous
    /// history by more than the threshold is flagged as sudden.
    pub fn push_level(&mut self, level: f64) {
        let level = clamp01(level);
        self.sudden = if self.history.is_empty() {
            false
        } else {
            let mean = self.history.iter().sum::<f64>() / self.history.len() as f64;
            level - mean > self.sudden_threshold
        };
        self.history.push_back(level);
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.level = level;
    }

    pub fn push_bins(&mut self, bins: &[u8]) {
        self.push_level(audio_rms(bins));
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Whether the most recent level was a sudden jump.
    pub fn is_sudden(&self) -> bool {
        self.sudden
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.level = 0.0;
        self.sudden = false;
    }
}

/// Low-level drivers sampled at each simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationInputs {
    /// Live touch points.
    pub touch_count: usize,
    /// Mean pressure of live touch points in [0, 1].
    pub touch_pressure: f64,
    /// Microphone RMS level in [0, 1].
    pub audio_level: f64,
    pub sudden_audio: bool,
    /// Current motion channel scalar.
    pub motion: f64,
}

impl SimulationInputs {
    /// `touch_count / 10`, clamped.
    pub fn touch_activity(&self) -> f64 {
        clamp01(self.touch_count as f64 / 10.0)
    }

    /// Combined interaction energy in [0, 1].
    pub fn energy(&self) -> f64 {
        clamp01(self.touch_activity() + self.audio_level + self.motion)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationGenerator {
    cfg: SimulationConfig,
}

impl SimulationGenerator {
    pub fn new(cfg: SimulationConfig) -> Self {
        Self { cfg }
    }

    /// Synthesize an emotion vector from scratch.
    pub fn emotions<R: Rng>(&self, inputs: &SimulationInputs, rng: &mut R) -> EmotionVector {
        let activity = inputs.touch_activity();
        let pressure = clamp01(inputs.touch_pressure);
        let sudden = if inputs.sudden_audio { 1.0 } else { 0.0 };
        let jitter = if self.cfg.jitter > 0.0 {
            rng.gen_range(-self.cfg.jitter..=self.cfg.jitter)
        } else {
            0.0
        };

        EmotionVector {
            happy: clamp01(0.6 * activity * (1.0 - pressure)),
            angry: clamp01(0.4 * activity * pressure),
            fearful: clamp01(0.5 * clamp01(inputs.motion) + 0.4 * sudden),
            surprised: clamp01(0.3 * sudden),
            neutral: clamp01(0.8 - inputs.energy() + jitter),
            ..EmotionVector::zero()
        }
    }

    /// Next gesture value: decays toward the floor, pushed up by touch.
    pub fn gesture(&self, current: f64, inputs: &SimulationInputs, decay: f64, floor: f64) -> f64 {
        clamp01((current * decay + inputs.touch_activity()).max(floor))
    }
}
