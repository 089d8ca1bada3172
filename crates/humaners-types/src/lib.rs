// ─────────────────────────────────────────────────────────────────────
// HumanERS — Threat Fusion Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! HumanERS threat fusion kernel.

pub mod channel;
pub mod config;
pub mod error;
pub mod score;

pub use channel::{Channel, ChannelMode, Emotion, EmotionVector};
pub use config::{ChannelWeights, FusionConfig};
pub use error::{HumanersError, HumanersResult};
pub use score::{
    clamp01, clamp_score, ChannelStatus, Reading, ThreatBand, ThreatSnapshot, BAND_COUNT,
};
