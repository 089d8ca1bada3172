// ─────────────────────────────────────────────────────────────────────
// HumanERS — Display Sink Interface
// ─────────────────────────────────────────────────────────────────────
//! Discretized threat output and the trait renderers implement.

use serde::Serialize;

use humaners_types::{clamp01, ThreatBand};

use crate::visuals::{Particle, TouchPoint};

/// A discretized threat level, emitted only when the displayed score moved
/// by more than the hysteresis threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatDisplay {
    pub displayed: f64,
    pub band: ThreatBand,
    pub level: u8,
    pub symbol: &'static str,
    /// Inner and outer background gradient stops.
    pub gradient: [&'static str; 2],
}

impl ThreatDisplay {
    pub fn from_score(displayed: f64) -> Self {
        let displayed = clamp01(displayed);
        let band = ThreatBand::from_score(displayed);
        let colors = band.colors();
        Self {
            displayed,
            band,
            level: band.level(),
            symbol: band.symbol_for(displayed),
            gradient: [colors[0], colors[1]],
        }
    }

    /// Status line text, e.g. `"👁️ Moderate"`.
    pub fn text(&self) -> String {
        format!("{} {}", self.symbol, self.band.label())
    }
}

/// Everything a renderer needs for one animation frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub now_ms: f64,
    pub displayed: f64,
    pub band: ThreatBand,
    pub particles: &'a [Particle],
    pub touches: &'a [TouchPoint],
}

/// Consumer of fusion output (DOM, canvas, terminal, test recorder).
pub trait DisplaySink {
    fn on_threat_update(&mut self, update: &ThreatDisplay);

    fn on_frame(&mut self, _frame: &FrameView<'_>) {}
}

/// Sink that discards everything.
pub struct NullSink;

impl DisplaySink for NullSink {
    fn on_threat_update(&mut self, _update: &ThreatDisplay) {}
}

/// Sink that records updates; used by tests and headless hosts.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub updates: Vec<ThreatDisplay>,
    pub frames: usize,
    pub last_displayed: Option<f64>,
    pub max_particles_seen: usize,
}

impl DisplaySink for RecordingSink {
    fn on_threat_update(&mut self, update: &ThreatDisplay) {
        self.updates.push(update.clone());
    }

    fn on_frame(&mut self, frame: &FrameView<'_>) {
        self.frames += 1;
        self.last_displayed = Some(frame.displayed);
        self.max_particles_seen = self.max_particles_seen.max(frame.particles.len());
    }
}
