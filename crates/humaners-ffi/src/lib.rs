// ─────────────────────────────────────────────────────────────────────
// HumanERS — Threat Fusion Kernel PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied — PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the HumanERS session.
//!
//! The Python frame-analysis backend runs the face and hand models and
//! pushes their raw output here; the kernel owns normalization, fallback
//! and fusion.
//!
//! # FFI Safety
//!
//! - No Python objects are stored; inputs are copied into Rust values.
//! - Session state sits behind one `parking_lot` lock (`SharedSession`).
//! - Invalid configs and unknown channel names raise `ValueError`.
//! - Detector errors are pushed as data and count toward fallback like
//!   any other failure, one count per push. Malformed gaze or motion
//!   events count the same way and never raise.
//!
//! Install: `pip install -e crates/humaners-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from humaners_kernel import Session
//!
//! s = Session(seed=7)
//! s.push_expressions({"fearful": 0.8, "neutral": 0.1})
//! frame = s.advance(0.0)
//! print(frame["band"], frame["displayed"])
//! ```

use std::collections::HashMap;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use humaners_core::{
    DisplaySink, FrameView, QueuedSignal, RawSignal, Session, SharedSession, SignalQueues,
    ThreatDisplay,
};
use humaners_types::{Channel, ChannelMode, EmotionVector, FusionConfig, HumanersError};

fn to_py_err(e: HumanersError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_channel(name: &str) -> PyResult<Channel> {
    Channel::from_name(name)
        .ok_or_else(|| to_py_err(HumanersError::Validation(format!("unknown channel '{name}'"))))
}

// ─── PyFusionConfig ─────────────────────────────────────────────────

/// Python-visible configuration for the fusion kernel.
#[pyclass(name = "FusionConfig")]
#[derive(Clone)]
struct PyFusionConfig {
    inner: FusionConfig,
}

#[pymethods]
impl PyFusionConfig {
    #[new]
    #[pyo3(signature = (
        emotion_weight = 0.5,
        gesture_weight = 0.4,
        eye_weight = 0.05,
        motion_weight = 0.05,
        smoothing_alpha = 0.1,
        display_hysteresis = 0.05,
        max_errors = 10,
        detect_deadline_ms = 150,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        emotion_weight: f64,
        gesture_weight: f64,
        eye_weight: f64,
        motion_weight: f64,
        smoothing_alpha: f64,
        display_hysteresis: f64,
        max_errors: u32,
        detect_deadline_ms: u64,
    ) -> PyResult<Self> {
        let mut config = FusionConfig::default();
        config.weights.emotion = emotion_weight;
        config.weights.gesture = gesture_weight;
        config.weights.eye = eye_weight;
        config.weights.motion = motion_weight;
        config.smoothing_alpha = smoothing_alpha;
        config.display_hysteresis = display_hysteresis;
        config.fallback.max_errors = max_errors;
        config.fallback.detect_deadline_ms = detect_deadline_ms;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string. Missing fields take their defaults.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config = FusionConfig::from_json(json).map_err(to_py_err)?;
        config.validate().map_err(to_py_err)?;
        Ok(Self { inner: config })
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        let w = &self.inner.weights;
        format!(
            "FusionConfig(weights=({}, {}, {}, {}), alpha={}, max_errors={})",
            w.emotion,
            w.gesture,
            w.eye,
            w.motion,
            self.inner.smoothing_alpha,
            self.inner.fallback.max_errors
        )
    }
}

// ─── Frame collection ───────────────────────────────────────────────

#[derive(Default)]
struct FrameSink {
    update: Option<ThreatDisplay>,
    particles: usize,
    touches: usize,
}

impl DisplaySink for FrameSink {
    fn on_threat_update(&mut self, update: &ThreatDisplay) {
        self.update = Some(update.clone());
    }

    fn on_frame(&mut self, frame: &FrameView<'_>) {
        self.particles = frame.particles.len();
        self.touches = frame.touches.len();
    }
}

fn display_dict<'py>(py: Python<'py>, d: &ThreatDisplay) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("level", d.level)?;
    dict.set_item("band", d.band.label())?;
    dict.set_item("symbol", d.symbol)?;
    dict.set_item("gradient", d.gradient.to_vec())?;
    dict.set_item("displayed", d.displayed)?;
    dict.set_item("text", d.text())?;
    Ok(dict)
}

// ─── PySession ──────────────────────────────────────────────────────

/// One fusion session fed from Python.
///
/// All four channels are push-driven: detections queued between two
/// `advance` calls are drained on the next detection tick. The newest
/// detection wins; every queued error counts. Input for a channel in
/// simulation, or pushed while paused, is dropped.
#[pyclass(name = "Session")]
struct PySession {
    inner: SharedSession,
    queues: SignalQueues,
}

#[pymethods]
impl PySession {
    #[new]
    #[pyo3(signature = (config = None, seed = None))]
    fn new(config: Option<PyFusionConfig>, seed: Option<u64>) -> PyResult<Self> {
        let config = config.map(|c| c.inner).unwrap_or_default();
        let seed = seed.unwrap_or_else(rand::random::<u64>);
        let (session, queues) = Session::with_queues(config, seed).map_err(to_py_err)?;
        log::debug!("python session created (seed {seed})");
        Ok(Self {
            inner: session.into_shared(),
            queues,
        })
    }

    /// First load attempt on every source. Called automatically by the
    /// first `advance`; retries happen on later frames and never block.
    fn initialize(&self) {
        self.inner.lock().initialize();
    }

    // ── Detector inputs ─────────────────────────────────────────────

    /// Expression probabilities by name, or `None` when no face was found.
    #[pyo3(signature = (expressions))]
    fn push_expressions(&self, expressions: Option<HashMap<String, f64>>) {
        match expressions {
            Some(map) => {
                let vector = EmotionVector::from_pairs(map.iter().map(|(k, v)| (k.as_str(), *v)));
                self.queues.emotion.push_raw(RawSignal::Expressions(vector));
            }
            None => self.queues.emotion.push(QueuedSignal::Absent),
        }
    }

    /// 21 `(x, y)` hand landmarks in pixels, or `None` when no hand was found.
    #[pyo3(signature = (landmarks))]
    fn push_hand(&self, landmarks: Option<Vec<(f64, f64)>>) {
        match landmarks {
            Some(points) => {
                let points = points.into_iter().map(|(x, y)| [x, y]).collect();
                self.queues.gesture.push_raw(RawSignal::Hand(points));
            }
            None => self.queues.gesture.push(QueuedSignal::Absent),
        }
    }

    /// Backend-computed gesture intensity in [0, 1].
    fn push_gesture_intensity(&self, intensity: f64) {
        self.queues.gesture.push_raw(RawSignal::Intensity(intensity));
    }

    /// Report a failed detector call on `channel`.
    fn push_detector_error(&self, channel: &str, message: String) -> PyResult<()> {
        let channel = parse_channel(channel)?;
        self.queues.get(channel).push(QueuedSignal::Failed(message));
        Ok(())
    }

    // ── Event inputs ────────────────────────────────────────────────

    fn push_gaze(&self, x: f64, y: f64, width: f64, height: f64) {
        self.inner.lock().push_gaze(x, y, width, height);
    }

    fn push_acceleration(&self, x: f64, y: f64, z: f64) {
        self.inner.lock().push_acceleration(x, y, z);
    }

    #[pyo3(signature = (x, y, pressure = None))]
    fn push_touch(&self, x: f64, y: f64, pressure: Option<f64>) {
        self.inner.lock().push_touch(x, y, pressure);
    }

    /// Microphone analyser bins (0–255).
    fn push_audio(&self, bins: Vec<u8>) {
        self.inner.lock().push_audio_bins(&bins);
    }

    fn push_audio_level(&self, level: f64) {
        self.inner.lock().push_audio_level(level);
    }

    // ── Loop ────────────────────────────────────────────────────────

    /// Run one frame at `now_ms`. `update` is set only when the displayed
    /// level moved past the hysteresis threshold.
    fn advance<'py>(&self, py: Python<'py>, now_ms: f64) -> PyResult<Bound<'py, PyDict>> {
        let mut sink = FrameSink::default();
        let mut session = self.inner.lock();
        session.advance(now_ms, &mut sink);

        let engine = session.engine();
        let dict = PyDict::new(py);
        dict.set_item("target", engine.target())?;
        dict.set_item("displayed", engine.displayed())?;
        dict.set_item("band", engine.band().label())?;
        dict.set_item("level", engine.band().level())?;
        dict.set_item("particles", sink.particles)?;
        dict.set_item("touches", sink.touches)?;
        match sink.update.as_ref() {
            Some(update) => dict.set_item("update", display_dict(py, update)?)?,
            None => dict.set_item("update", py.None())?,
        }
        Ok(dict)
    }

    fn pause(&self) {
        self.inner.lock().pause();
    }

    fn resume(&self, now_ms: f64) {
        self.inner.lock().resume(now_ms);
    }

    fn reset(&self) {
        self.inner.lock().reset();
    }

    fn set_viewport(&self, width: f64, height: f64) {
        self.inner.lock().set_viewport(width, height);
    }

    // ── Queries ─────────────────────────────────────────────────────

    fn snapshot<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let snap = self.inner.lock().snapshot();
        let dict = PyDict::new(py);
        dict.set_item("target", snap.target)?;
        dict.set_item("displayed", snap.displayed)?;
        dict.set_item("band", snap.band.label())?;
        dict.set_item("level", snap.band.level())?;
        dict.set_item("paused", snap.paused)?;
        dict.set_item("gesture_label", snap.gesture_label())?;
        dict.set_item("dominant_emotion", snap.dominant_emotion.name())?;

        let emotions = PyDict::new(py);
        for (emotion, pct) in &snap.emotion_percentages {
            emotions.set_item(emotion.name(), *pct)?;
        }
        dict.set_item("emotions", emotions)?;

        let channels = PyDict::new(py);
        for status in &snap.channels {
            let c = PyDict::new(py);
            c.set_item("value", status.value)?;
            c.set_item("available", status.available)?;
            c.set_item("simulated", status.mode == ChannelMode::Simulation)?;
            c.set_item("status", status.label())?;
            channels.set_item(status.channel.name(), c)?;
        }
        dict.set_item("channels", channels)?;
        Ok(dict)
    }

    /// Feature names of channels running on real detectors.
    fn working_features(&self) -> Vec<&'static str> {
        self.inner
            .lock()
            .working_features()
            .into_iter()
            .map(Channel::feature_name)
            .collect()
    }

    #[getter]
    fn paused(&self) -> bool {
        self.inner.lock().is_paused()
    }

    fn __repr__(&self) -> String {
        let session = self.inner.lock();
        let engine = session.engine();
        format!(
            "Session(displayed={:.4}, band={}, paused={})",
            engine.displayed(),
            engine.band().label(),
            session.is_paused()
        )
    }
}

// ─── Module ─────────────────────────────────────────────────────────

#[pymodule]
fn humaners_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFusionConfig>()?;
    m.add_class::<PySession>()?;
    Ok(())
}
