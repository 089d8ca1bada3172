// ─────────────────────────────────────────────────────────────────────
// HumanERS — Session (Cooperative Scheduler)
// ─────────────────────────────────────────────────────────────────────
//! One owned context per interactive session.
//!
//! The host calls [`Session::advance`] once per display frame with a
//! monotonic timestamp. Each call runs, in order:
//!
//! 1. due per-channel ticks (detector poll, or simulation when demoted),
//! 2. the fixed-cadence assessment, notifying the sink on level changes,
//! 3. one animation tick (smoothing, visuals, `on_frame`).
//!
//! Timers are wall-clock independent: only the `now_ms` passed in matters,
//! so a paused session simply stops consuming time and resumes from `now`
//! without replaying missed ticks. Model load retries run on the same
//! clock, so no call ever sleeps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use humaners_types::{
    Channel, ChannelMode, FusionConfig, HumanersError, HumanersResult, ThreatSnapshot,
};

use crate::display::{DisplaySink, FrameView};
use crate::emotion::EmotionNormalizer;
use crate::fusion::FusionEngine;
use crate::gaze::GazeNormalizer;
use crate::gesture::GestureNormalizer;
use crate::health::ChannelHealth;
use crate::motion::MotionNormalizer;
use crate::normalizer::Normalizer;
use crate::simulation::{AudioMeter, SimulationGenerator, SimulationInputs};
use crate::source::{Detection, QueuedSource, RawSignal, SignalQueue, SignalSource, UnavailableSource};
use crate::visuals::{Particle, ParticleField, TouchField, TouchPoint};

/// Thread-safe session handle for hosts that feed inputs from several
/// threads. Every update goes through the one lock.
pub type SharedSession<R = StdRng> = Arc<Mutex<Session<R>>>;

/// Progress of a channel's model load.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoadState {
    /// `attempts` made so far; the next one is due at `retry_at_ms`.
    Pending { attempts: u32, retry_at_ms: f64 },
    Ready,
}

/// Source, normalizer and health of one channel.
struct ChannelDriver {
    source: Box<dyn SignalSource>,
    normalizer: Box<dyn Normalizer>,
    health: ChannelHealth,
    load: LoadState,
    next_due_ms: f64,
}

impl ChannelDriver {
    /// Count one failure. Returns true when it demoted the channel.
    fn fail(&mut self, err: HumanersError) -> bool {
        let demoted = self.health.record_failure(err);
        if demoted {
            self.normalizer.reset();
            self.source.discard_pending();
        }
        demoted
    }

    fn is_ready(&self) -> bool {
        self.load == LoadState::Ready && !self.health.is_simulated()
    }
}

/// Host-side push handles for a session built with [`Session::with_queues`].
#[derive(Clone)]
pub struct SignalQueues {
    pub emotion: SignalQueue,
    pub gesture: SignalQueue,
    pub eye: SignalQueue,
    pub motion: SignalQueue,
}

impl SignalQueues {
    pub fn get(&self, channel: Channel) -> &SignalQueue {
        match channel {
            Channel::Emotion => &self.emotion,
            Channel::Gesture => &self.gesture,
            Channel::Eye => &self.eye,
            Channel::Motion => &self.motion,
        }
    }
}

pub struct Session<R: Rng = StdRng> {
    config: FusionConfig,
    engine: FusionEngine,
    drivers: Vec<ChannelDriver>,
    generator: SimulationGenerator,
    audio: AudioMeter,
    particles: ParticleField,
    touches: TouchField,
    rng: R,
    now_ms: f64,
    next_assess_ms: f64,
    initialized: bool,
    paused: bool,
}

impl Session<StdRng> {
    /// Session whose four channels are all push-driven queues.
    pub fn with_queues(config: FusionConfig, seed: u64) -> HumanersResult<(Self, SignalQueues)> {
        let (emotion, eq) = QueuedSource::new(Channel::Emotion);
        let (gesture, gq) = QueuedSource::new(Channel::Gesture);
        let (eye, yq) = QueuedSource::new(Channel::Eye);
        let (motion, mq) = QueuedSource::new(Channel::Motion);
        let sources: Vec<Box<dyn SignalSource>> = vec![
            Box::new(emotion),
            Box::new(gesture),
            Box::new(eye),
            Box::new(motion),
        ];
        let session = Self::new(config, sources, StdRng::seed_from_u64(seed))?;
        Ok((
            session,
            SignalQueues {
                emotion: eq,
                gesture: gq,
                eye: yq,
                motion: mq,
            },
        ))
    }
}

impl<R: Rng> Session<R> {
    /// Build a session from one source per channel.
    ///
    /// Channels without a source get an [`UnavailableSource`] and start in
    /// simulation once initialized. Two sources for the same channel are
    /// rejected.
    pub fn new(
        config: FusionConfig,
        sources: Vec<Box<dyn SignalSource>>,
        rng: R,
    ) -> HumanersResult<Self> {
        config.validate()?;

        let mut slots: [Option<Box<dyn SignalSource>>; 4] = [None, None, None, None];
        for source in sources {
            let idx = source.channel().index();
            if slots[idx].is_some() {
                return Err(HumanersError::Config(format!(
                    "duplicate signal source for {} channel",
                    source.channel()
                )));
            }
            slots[idx] = Some(source);
        }

        let mut drivers = Vec::with_capacity(4);
        for (channel, slot) in Channel::ALL.into_iter().zip(slots) {
            let source: Box<dyn SignalSource> = match slot {
                Some(source) => source,
                None => Box::new(UnavailableSource::new(channel, "no detector registered")),
            };
            drivers.push(ChannelDriver {
                source,
                normalizer: normalizer_for(channel, &config),
                health: ChannelHealth::new(channel, config.fallback.max_errors),
                load: LoadState::Pending {
                    attempts: 0,
                    retry_at_ms: 0.0,
                },
                next_due_ms: 0.0,
            });
        }

        Ok(Self {
            engine: FusionEngine::new(config.clone()),
            generator: SimulationGenerator::new(config.simulation.clone()),
            audio: AudioMeter::new(
                config.simulation.audio_history,
                config.simulation.sudden_threshold,
            ),
            particles: ParticleField::new(&config.visuals),
            touches: TouchField::new(&config.visuals),
            drivers,
            rng,
            now_ms: 0.0,
            next_assess_ms: 0.0,
            initialized: false,
            paused: false,
            config,
        })
    }

    pub fn into_shared(self) -> SharedSession<R> {
        Arc::new(Mutex::new(self))
    }

    // ── Startup ─────────────────────────────────────────────────────

    /// Make the first load attempt on every source. Missing detectors go
    /// straight to simulation; failed loads are retried by later `advance`
    /// calls after a linear backoff, and a channel whose attempts run out
    /// falls back too.
    ///
    /// Runs once; later calls are no-ops. `advance` calls it if the host
    /// did not.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        for idx in 0..self.drivers.len() {
            let channel = Channel::ALL[idx];
            if self.drivers[idx].source.is_available() {
                self.try_load(idx, self.now_ms);
            } else {
                self.fall_back_at_load(
                    idx,
                    HumanersError::Unavailable(format!(
                        "{} detector not present",
                        channel.feature_name()
                    )),
                );
            }
        }
        log::info!(
            "session initialized, working features: {:?}",
            self.working_features()
        );
    }

    /// One load attempt. A load that returns after the deadline counts as
    /// timed out. `Unavailable` is not retried.
    fn try_load(&mut self, idx: usize, now_ms: f64) {
        let channel = Channel::ALL[idx];
        let fb = &self.config.fallback;
        let (max_attempts, timeout_ms, backoff_ms) =
            (fb.load_attempts, fb.load_timeout_ms, fb.load_backoff_ms);

        let driver = &mut self.drivers[idx];
        let attempt = match driver.load {
            LoadState::Pending { attempts, .. } => attempts + 1,
            LoadState::Ready => return,
        };

        let started = Instant::now();
        let result = match driver.source.load() {
            Ok(()) if started.elapsed() > Duration::from_millis(timeout_ms) => {
                Err(HumanersError::Timeout {
                    deadline_ms: timeout_ms,
                })
            }
            other => other,
        };

        match result {
            Ok(()) => {
                driver.load = LoadState::Ready;
                log::info!("{} ready", channel.feature_name());
            }
            Err(err @ HumanersError::Unavailable(_)) => self.fall_back_at_load(idx, err),
            Err(err) => {
                log::warn!("{channel} load attempt {attempt}/{max_attempts} failed: {err}");
                if attempt >= max_attempts {
                    self.fall_back_at_load(idx, err);
                } else {
                    driver.load = LoadState::Pending {
                        attempts: attempt,
                        retry_at_ms: now_ms + backoff_ms as f64 * f64::from(attempt),
                    };
                }
            }
        }
    }

    fn fall_back_at_load(&mut self, idx: usize, err: HumanersError) {
        let channel = Channel::ALL[idx];
        let available = !matches!(err, HumanersError::Unavailable(_));
        self.drivers[idx].health.mark_unavailable(err);
        self.engine.set_available(channel, available);
        self.engine.set_mode(channel, ChannelMode::Simulation);
    }

    // ── Scheduler ───────────────────────────────────────────────────

    /// Run everything due at `now_ms`, then one animation frame.
    pub fn advance(&mut self, now_ms: f64, sink: &mut dyn DisplaySink) {
        if !self.initialized {
            self.now_ms = now_ms;
            self.initialize();
            self.rearm(now_ms);
        }
        if self.paused {
            self.discard_pending();
            return;
        }
        self.now_ms = now_ms;

        for idx in 0..self.drivers.len() {
            let driver = &mut self.drivers[idx];
            if driver.health.is_simulated() {
                driver.source.discard_pending();
            } else if let LoadState::Pending { retry_at_ms, .. } = driver.load {
                if now_ms >= retry_at_ms {
                    self.try_load(idx, now_ms);
                }
                continue;
            }
            if now_ms < self.drivers[idx].next_due_ms {
                continue;
            }
            let interval = self.channel_tick(idx, now_ms);
            self.drivers[idx].next_due_ms = now_ms + interval;
        }

        if now_ms >= self.next_assess_ms {
            self.engine.assess();
            if let Some(update) = self.engine.take_display_update() {
                sink.on_threat_update(&update);
            }
            self.next_assess_ms = now_ms + self.config.timing.assess_interval_ms;
        }

        let displayed = self.engine.animate();
        self.touches.step();
        self.particles.step(displayed, &mut self.rng);
        sink.on_frame(&FrameView {
            now_ms,
            displayed,
            band: self.engine.band(),
            particles: self.particles.particles(),
            touches: self.touches.points(),
        });
    }

    /// Tick one channel and return the interval until its next tick.
    fn channel_tick(&mut self, idx: usize, now_ms: f64) -> f64 {
        let channel = Channel::ALL[idx];
        if self.drivers[idx].health.is_simulated() {
            self.simulate(channel);
            return match channel {
                Channel::Emotion => self.config.timing.emotion_simulation_interval_ms,
                Channel::Gesture => self.config.timing.gesture_simulation_interval_ms,
                Channel::Eye | Channel::Motion => self.config.timing.detect_interval_ms,
            };
        }
        self.detect(idx, now_ms);
        self.config.timing.detect_interval_ms
    }

    /// Apply everything the source reported since the last tick, oldest
    /// first. Each failure counts on its own; a success resets the count.
    fn detect(&mut self, idx: usize, now_ms: f64) {
        let channel = Channel::ALL[idx];
        let deadline_ms = self.config.fallback.detect_deadline_ms;
        let driver = &mut self.drivers[idx];

        let started = Instant::now();
        let mut polled = driver.source.poll_pending(now_ms);
        if started.elapsed() > Duration::from_millis(deadline_ms) {
            polled = vec![Err(HumanersError::Timeout { deadline_ms })];
        }

        for result in polled {
            let outcome = match result {
                Ok(Detection::Fresh(raw)) => {
                    let ctx = self.engine.context(channel, now_ms);
                    driver.normalizer.normalize(&raw, &ctx).map(Some)
                }
                Ok(Detection::Absent) => {
                    self.engine.decay(channel, driver.normalizer.absence_decay());
                    Ok(None)
                }
                Ok(Detection::Idle) => continue,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(reading) => {
                    if let Some(reading) = reading {
                        self.engine.apply(&reading);
                    }
                    driver.health.record_success();
                }
                Err(err) => {
                    if driver.fail(err) {
                        self.engine.set_mode(channel, ChannelMode::Simulation);
                        break;
                    }
                }
            }
        }
    }

    /// Synthetic tick for a demoted channel. Eye and motion have no
    /// synthetic driver and hold their last value.
    fn simulate(&mut self, channel: Channel) {
        let inputs = self.simulation_inputs();
        match channel {
            Channel::Emotion => {
                let vector = self.generator.emotions(&inputs, &mut self.rng);
                self.engine.set_emotions(vector);
            }
            Channel::Gesture => {
                let next = self.generator.gesture(
                    self.engine.value(Channel::Gesture),
                    &inputs,
                    self.config.gesture.absence_decay,
                    self.config.decay_floor,
                );
                self.engine.set_value(Channel::Gesture, next);
            }
            Channel::Eye | Channel::Motion => {}
        }
    }

    pub fn simulation_inputs(&self) -> SimulationInputs {
        SimulationInputs {
            touch_count: self.touches.count(),
            touch_pressure: self.touches.mean_intensity(),
            audio_level: self.audio.level(),
            sudden_audio: self.audio.is_sudden(),
            motion: self.engine.value(Channel::Motion),
        }
    }

    // ── Control ─────────────────────────────────────────────────────

    /// Freeze every loop. State is kept as is; detector input queued while
    /// paused is dropped.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.discard_pending();
            log::info!("session paused at {:.0} ms", self.now_ms);
        }
    }

    /// Restart the loops from `now_ms`. Ticks missed while paused are not
    /// replayed.
    pub fn resume(&mut self, now_ms: f64) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.discard_pending();
        self.rearm(now_ms);
        log::info!("session resumed at {now_ms:.0} ms");
    }

    fn discard_pending(&mut self) {
        for d in self.drivers.iter_mut() {
            d.source.discard_pending();
        }
    }

    fn rearm(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
        for d in self.drivers.iter_mut() {
            d.next_due_ms = now_ms;
        }
        self.next_assess_ms = now_ms;
    }

    /// Back to start-of-session values. Channel modes stay as they are.
    pub fn reset(&mut self) {
        self.engine.reset();
        for d in self.drivers.iter_mut() {
            d.normalizer.reset();
        }
        self.audio.reset();
        self.touches.clear();
        self.particles.clear();
        log::debug!("session state reset");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ── Host inputs ─────────────────────────────────────────────────

    /// Pointer or touch contact. `pressure` in [0, 1] when the device
    /// reports it.
    pub fn push_touch(&mut self, x: f64, y: f64, pressure: Option<f64>) {
        if self.paused {
            return;
        }
        self.touches.add(x, y, pressure, &mut self.rng);
    }

    /// Analyser frequency bins (0–255) from the microphone.
    pub fn push_audio_bins(&mut self, bins: &[u8]) {
        if self.paused {
            return;
        }
        self.audio.push_bins(bins);
    }

    pub fn push_audio_level(&mut self, level: f64) {
        if self.paused {
            return;
        }
        self.audio.push_level(level);
    }

    /// Device-motion event. Applied immediately on the motion channel.
    pub fn push_acceleration(&mut self, x: f64, y: f64, z: f64) {
        self.push_event(Channel::Motion, RawSignal::Acceleration { x, y, z });
    }

    /// Gaze point in display pixels. Applied immediately on the eye channel.
    ///
    /// A malformed point counts as a failed detection on the eye channel.
    pub fn push_gaze(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.push_event(
            Channel::Eye,
            RawSignal::Gaze {
                x,
                y,
                width,
                height,
            },
        );
    }

    fn push_event(&mut self, channel: Channel, raw: RawSignal) {
        if self.paused {
            return;
        }
        let driver = &mut self.drivers[channel.index()];
        if !driver.is_ready() {
            log::trace!("{channel} event ignored, detector not active");
            return;
        }
        let ctx = self.engine.context(channel, self.now_ms);
        match driver.normalizer.normalize(&raw, &ctx) {
            Ok(reading) => {
                self.engine.apply(&reading);
                driver.health.record_success();
            }
            Err(err) => {
                if driver.fail(err) {
                    self.engine.set_mode(channel, ChannelMode::Simulation);
                }
            }
        }
    }

    /// Resize the particle field.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.particles.resize(width, height);
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Channels currently served by a loaded detector.
    pub fn working_features(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|&c| self.engine.is_available(c) && self.drivers[c.index()].is_ready())
            .collect()
    }

    pub fn mode(&self, channel: Channel) -> ChannelMode {
        self.drivers[channel.index()].health.mode()
    }

    pub fn health(&self, channel: Channel) -> &ChannelHealth {
        &self.drivers[channel.index()].health
    }

    pub fn engine(&self) -> &FusionEngine {
        &self.engine
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> ThreatSnapshot {
        self.engine.snapshot(self.paused)
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    pub fn touches(&self) -> &[TouchPoint] {
        self.touches.points()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

fn normalizer_for(channel: Channel, config: &FusionConfig) -> Box<dyn Normalizer> {
    match channel {
        Channel::Emotion => Box::new(EmotionNormalizer::new(config.emotion.clone())),
        Channel::Gesture => Box::new(GestureNormalizer::new(config.gesture.clone())),
        Channel::Eye => Box::new(GazeNormalizer::new(config.gaze.clone())),
        Channel::Motion => Box::new(MotionNormalizer::new(config.motion.clone())),
    }
}
