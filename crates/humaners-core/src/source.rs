// ─────────────────────────────────────────────────────────────────────
// HumanERS — Signal Source Interface
// ─────────────────────────────────────────────────────────────────────
//! Capability-provider trait for per-channel signal sources, plus the
//! host-facing implementations.
//!
//! Real detectors (face expression nets, hand pose models, gaze trackers,
//! accelerometers) live outside this crate. They plug in either through
//! `ExternalSource` (a poll callback) or `QueuedSource` (the host pushes
//! raw signals as they arrive and the session drains them on each tick).

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use humaners_types::{Channel, EmotionVector, HumanersError, HumanersResult};

/// Raw detector output, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSignal {
    /// Expression probabilities from a face detector.
    Expressions(EmotionVector),
    /// Landmarks of the first detected hand, `[x, y]` in pixels.
    /// Index 0 is the wrist; 4, 8, 12, 16, 20 are fingertips.
    Hand(Vec<[f64; 2]>),
    /// Gaze point in display-pixel space.
    Gaze {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Device acceleration including gravity.
    Acceleration { x: f64, y: f64, z: f64 },
    /// Already-normalized intensity from an upstream analyzer.
    Intensity(f64),
}

impl RawSignal {
    pub fn kind(&self) -> &'static str {
        match self {
            RawSignal::Expressions(_) => "expressions",
            RawSignal::Hand(_) => "hand",
            RawSignal::Gaze { .. } => "gaze",
            RawSignal::Acceleration { .. } => "acceleration",
            RawSignal::Intensity(_) => "intensity",
        }
    }
}

/// Outcome of one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// A fresh detection.
    Fresh(RawSignal),
    /// The detector ran but saw nothing (no face, no hand). Decays the channel.
    Absent,
    /// Nothing new since the last poll. Leaves the channel untouched.
    Idle,
}

/// Trait for per-channel signal sources.
///
/// Every `Err` a source reports counts toward the channel's fallback budget.
pub trait SignalSource: Send {
    fn channel(&self) -> Channel;

    /// Whether the backing library/model exists at all.
    fn is_available(&self) -> bool;

    /// One-time model load. Called before polling starts.
    fn load(&mut self) -> HumanersResult<()> {
        Ok(())
    }

    fn poll(&mut self, now_ms: f64) -> HumanersResult<Detection>;

    /// Everything observed since the previous tick, oldest first.
    ///
    /// Sources that buffer between ticks override this so that each
    /// buffered failure is reported on its own.
    fn poll_pending(&mut self, now_ms: f64) -> Vec<HumanersResult<Detection>> {
        vec![self.poll(now_ms)]
    }

    /// Drop buffered input. Called while the session is paused and once the
    /// channel runs on simulation.
    fn discard_pending(&mut self) {}
}

type PollFn = Box<dyn FnMut(f64) -> HumanersResult<Detection> + Send>;
type LoadFn = Box<dyn FnMut() -> HumanersResult<()> + Send>;

/// Source that delegates to host callbacks.
///
/// Used by the FFI layer and by tests to script detector behavior.
pub struct ExternalSource {
    channel: Channel,
    poll_fn: PollFn,
    load_fn: Option<LoadFn>,
}

impl ExternalSource {
    pub fn new(
        channel: Channel,
        poll_fn: impl FnMut(f64) -> HumanersResult<Detection> + Send + 'static,
    ) -> Self {
        Self {
            channel,
            poll_fn: Box::new(poll_fn),
            load_fn: None,
        }
    }

    pub fn with_loader(
        mut self,
        load_fn: impl FnMut() -> HumanersResult<()> + Send + 'static,
    ) -> Self {
        self.load_fn = Some(Box::new(load_fn));
        self
    }
}

impl SignalSource for ExternalSource {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn is_available(&self) -> bool {
        true
    }

    fn load(&mut self) -> HumanersResult<()> {
        match self.load_fn.as_mut() {
            Some(f) => f(),
            None => Ok(()),
        }
    }

    fn poll(&mut self, now_ms: f64) -> HumanersResult<Detection> {
        (self.poll_fn)(now_ms)
    }
}

/// Entry pushed by the host into a [`QueuedSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedSignal {
    Detected(RawSignal),
    /// The detector ran and saw nothing.
    Absent,
    Failed(String),
}

/// Push-driven source. The host feeds detections through a cloneable
/// [`SignalQueue`]; each tick drains the queue.
///
/// Runs of detections collapse to the newest one, but every `Failed`
/// entry is reported, in push order, so a burst of failures between two
/// ticks counts once per failure.
///
/// An empty queue polls as `Idle`, or as `Absent` when `absent_when_empty`
/// is set.
pub struct QueuedSource {
    channel: Channel,
    queue: SignalQueue,
    absent_when_empty: bool,
}

/// Host-side handle of a [`QueuedSource`].
#[derive(Clone, Default)]
pub struct SignalQueue {
    inner: Arc<Mutex<VecDeque<QueuedSignal>>>,
}

impl SignalQueue {
    pub fn push(&self, signal: QueuedSignal) {
        self.inner.lock().push_back(signal);
    }

    pub fn push_raw(&self, raw: RawSignal) {
        self.push(QueuedSignal::Detected(raw));
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn drain(&self) -> VecDeque<QueuedSignal> {
        std::mem::take(&mut *self.inner.lock())
    }

    fn clear(&self) -> usize {
        let mut q = self.inner.lock();
        let dropped = q.len();
        q.clear();
        dropped
    }
}

impl QueuedSource {
    pub fn new(channel: Channel) -> (Self, SignalQueue) {
        let queue = SignalQueue::default();
        (
            Self {
                channel,
                queue: queue.clone(),
                absent_when_empty: false,
            },
            queue,
        )
    }

    /// Treat an empty queue as "detector saw nothing" (decays the channel).
    pub fn absent_when_empty(mut self) -> Self {
        self.absent_when_empty = true;
        self
    }
}

impl SignalSource for QueuedSource {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn is_available(&self) -> bool {
        true
    }

    /// Newest entry only. The session uses `poll_pending`, which keeps
    /// every failure.
    fn poll(&mut self, now_ms: f64) -> HumanersResult<Detection> {
        self.poll_pending(now_ms)
            .pop()
            .unwrap_or(Ok(Detection::Idle))
    }

    fn poll_pending(&mut self, _now_ms: f64) -> Vec<HumanersResult<Detection>> {
        let mut out = Vec::new();
        let mut latest = None;
        for entry in self.queue.drain() {
            match entry {
                QueuedSignal::Detected(raw) => latest = Some(Detection::Fresh(raw)),
                QueuedSignal::Absent => latest = Some(Detection::Absent),
                QueuedSignal::Failed(msg) => {
                    if let Some(detection) = latest.take() {
                        out.push(Ok(detection));
                    }
                    out.push(Err(HumanersError::Detection(msg)));
                }
            }
        }
        match latest {
            Some(detection) => out.push(Ok(detection)),
            None if out.is_empty() && self.absent_when_empty => out.push(Ok(Detection::Absent)),
            None if out.is_empty() => out.push(Ok(Detection::Idle)),
            None => {}
        }
        out
    }

    fn discard_pending(&mut self) {
        let dropped = self.queue.clear();
        if dropped > 0 {
            log::trace!("{}: discarded {dropped} queued signal(s)", self.channel);
        }
    }
}

/// Source for a channel whose detector library is missing.
pub struct UnavailableSource {
    channel: Channel,
    reason: String,
}

impl UnavailableSource {
    pub fn new(channel: Channel, reason: impl Into<String>) -> Self {
        Self {
            channel,
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl SignalSource for UnavailableSource {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn is_available(&self) -> bool {
        false
    }

    fn load(&mut self) -> HumanersResult<()> {
        Err(HumanersError::Unavailable(self.reason.clone()))
    }

    fn poll(&mut self, _now_ms: f64) -> HumanersResult<Detection> {
        Err(HumanersError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_source_delegates() {
        let mut src = ExternalSource::new(Channel::Eye, |_| {
            Ok(Detection::Fresh(RawSignal::Intensity(0.42)))
        });
        assert!(src.is_available());
        assert_eq!(
            src.poll(0.0).unwrap(),
            Detection::Fresh(RawSignal::Intensity(0.42))
        );
    }

    #[test]
    fn test_external_source_loader() {
        let mut src = ExternalSource::new(Channel::Emotion, |_| Ok(Detection::Absent))
            .with_loader(|| Err(HumanersError::Timeout { deadline_ms: 10 }));
        assert!(src.load().is_err());
    }

    #[test]
    fn test_queued_source_keeps_latest() {
        let (mut src, queue) = QueuedSource::new(Channel::Motion);
        queue.push_raw(RawSignal::Intensity(0.1));
        queue.push_raw(RawSignal::Intensity(0.9));
        assert_eq!(
            src.poll(0.0).unwrap(),
            Detection::Fresh(RawSignal::Intensity(0.9))
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queued_source_empty_is_idle() {
        let (mut src, _queue) = QueuedSource::new(Channel::Eye);
        assert_eq!(src.poll(0.0).unwrap(), Detection::Idle);
    }

    #[test]
    fn test_queued_source_absent_when_empty() {
        let (src, _queue) = QueuedSource::new(Channel::Gesture);
        let mut src = src.absent_when_empty();
        assert_eq!(src.poll(0.0).unwrap(), Detection::Absent);
    }

    #[test]
    fn test_queued_failure_maps_to_detection_error() {
        let (mut src, queue) = QueuedSource::new(Channel::Emotion);
        queue.push(QueuedSignal::Failed("model crashed".into()));
        assert!(matches!(src.poll(0.0), Err(HumanersError::Detection(_))));
    }

    #[test]
    fn test_queued_failures_each_reported() {
        let (mut src, queue) = QueuedSource::new(Channel::Gesture);
        for i in 0..3 {
            queue.push(QueuedSignal::Failed(format!("hand model error {i}")));
        }
        let polled = src.poll_pending(0.0);
        assert_eq!(polled.len(), 3);
        assert!(polled.iter().all(|r| r.is_err()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queued_detection_after_failure_kept_in_order() {
        let (mut src, queue) = QueuedSource::new(Channel::Emotion);
        queue.push_raw(RawSignal::Intensity(0.1));
        queue.push_raw(RawSignal::Intensity(0.2));
        queue.push(QueuedSignal::Failed("timeout".into()));
        queue.push(QueuedSignal::Absent);
        queue.push_raw(RawSignal::Intensity(0.7));
        let polled = src.poll_pending(0.0);
        assert_eq!(polled.len(), 3);
        assert_eq!(
            polled[0].clone().unwrap(),
            Detection::Fresh(RawSignal::Intensity(0.2))
        );
        assert!(polled[1].is_err());
        assert_eq!(
            polled[2].clone().unwrap(),
            Detection::Fresh(RawSignal::Intensity(0.7))
        );
    }

    #[test]
    fn test_queued_discard_pending() {
        let (mut src, queue) = QueuedSource::new(Channel::Emotion);
        queue.push_raw(RawSignal::Intensity(0.3));
        queue.push(QueuedSignal::Failed("stale".into()));
        src.discard_pending();
        assert!(queue.is_empty());
        assert_eq!(src.poll(0.0).unwrap(), Detection::Idle);
    }

    #[test]
    fn test_unavailable_source() {
        let mut src = UnavailableSource::new(Channel::Eye, "gaze tracker not loaded");
        assert!(!src.is_available());
        assert!(src.load().is_err());
        assert!(src.poll(0.0).is_err());
    }
}
