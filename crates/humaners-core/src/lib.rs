// ─────────────────────────────────────────────────────────────────────
// HumanERS — Threat Fusion Kernel Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Normalization, fusion and scheduling of unreliable human signals
//! (emotion, gesture, eye, motion) into a single smoothed threat scalar.
//!
//! # Invariants
//!
//! 1. **Everything stays in [0, 1]**: channel scalars, emotion categories,
//!    the target and the displayed value. Non-finite inputs are clamped
//!    by `clamp_score` (NaN to the lower bound, ±Inf to the nearest one).
//!
//! 2. **Fallback is one-way**: a channel demoted to simulation (missing
//!    detector, failed load, or `max_errors` consecutive failures) stays
//!    there for the rest of the session.
//!
//! 3. **Combination is pure**: the target depends only on the four channel
//!    scalars and the fixed weights, which sum to 1.0.
//!
//! 4. **Time is supplied by the host**: every loop runs off the `now_ms`
//!    passed to `Session::advance`. Pausing stops consuming time and
//!    resuming never replays missed ticks.

pub mod display;
pub mod emotion;
pub mod fusion;
pub mod gaze;
pub mod gesture;
pub mod health;
pub mod motion;
pub mod normalizer;
pub mod session;
pub mod simulation;
pub mod source;
pub mod visuals;

pub use display::{DisplaySink, FrameView, NullSink, RecordingSink, ThreatDisplay};
pub use emotion::{emotion_score, EmotionNormalizer};
pub use fusion::{combine, FusionEngine};
pub use gaze::{gaze_score, GazeNormalizer};
pub use gesture::{finger_spread, GestureNormalizer};
pub use health::ChannelHealth;
pub use motion::{acceleration_magnitude, MotionNormalizer};
pub use normalizer::{NormalizeContext, Normalizer};
pub use session::{Session, SharedSession, SignalQueues};
pub use simulation::{audio_rms, AudioMeter, SimulationGenerator, SimulationInputs};
pub use source::{
    Detection, ExternalSource, QueuedSignal, QueuedSource, RawSignal, SignalQueue, SignalSource,
    UnavailableSource,
};
pub use visuals::{Particle, ParticleField, TouchField, TouchPoint};
