// ─────────────────────────────────────────────────────────────────────
// HumanERS — Threat Fusion Kernel Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the per-frame hot path. One `advance` has to
//! fit comfortably inside a 16 ms display frame.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use humaners_core::{
    combine, emotion_score, EmotionNormalizer, FusionEngine, GestureNormalizer, NormalizeContext,
    Normalizer, NullSink, RawSignal, Session,
};
use humaners_types::config::{ChannelWeights, EmotionConfig, GestureConfig};
use humaners_types::{Channel, EmotionVector, FusionConfig};

fn hand() -> Vec<[f64; 2]> {
    (0..21)
        .map(|i| [100.0 + i as f64 * 7.5, 200.0 + (i % 5) as f64 * 11.0])
        .collect()
}

fn fearful() -> EmotionVector {
    EmotionVector {
        fearful: 0.7,
        surprised: 0.2,
        neutral: 0.1,
        ..EmotionVector::zero()
    }
}

// ── Pure functions ──────────────────────────────────────────────────

fn bench_combine(c: &mut Criterion) {
    let w = ChannelWeights::default();
    c.bench_function("combine", |b| {
        b.iter(|| combine(black_box(&w), black_box(&[0.3, 0.7, 0.1, 0.9])))
    });
}

fn bench_emotion_score(c: &mut Criterion) {
    let cfg = EmotionConfig::default();
    let v = fearful();
    c.bench_function("emotion_score", |b| {
        b.iter(|| emotion_score(black_box(&v), &cfg))
    });
}

// ── Normalizers ─────────────────────────────────────────────────────

fn bench_emotion_normalize(c: &mut Criterion) {
    let mut n = EmotionNormalizer::new(EmotionConfig::default());
    let raw = RawSignal::Expressions(fearful());
    let prev = EmotionVector::default();
    c.bench_function("emotion_normalize", |b| {
        b.iter(|| {
            let ctx = NormalizeContext {
                now_ms: 0.0,
                current: 0.2,
                emotions: &prev,
            };
            n.normalize(black_box(&raw), &ctx)
        })
    });
}

fn bench_gesture_normalize(c: &mut Criterion) {
    let mut n = GestureNormalizer::new(GestureConfig::default());
    let raw = RawSignal::Hand(hand());
    let prev = EmotionVector::default();
    let mut now = 0.0;
    c.bench_function("gesture_normalize", |b| {
        b.iter(|| {
            now += 100.0;
            let ctx = NormalizeContext {
                now_ms: now,
                current: 0.2,
                emotions: &prev,
            };
            n.normalize(black_box(&raw), &ctx)
        })
    });
}

// ── Engine loops ────────────────────────────────────────────────────

fn bench_assess_and_animate(c: &mut Criterion) {
    let mut engine = FusionEngine::new(FusionConfig::default());
    engine.set_value(Channel::Gesture, 0.8);
    c.bench_function("assess_animate", |b| {
        b.iter(|| {
            engine.assess();
            engine.take_display_update();
            black_box(engine.animate())
        })
    });
}

// ── Full frame ──────────────────────────────────────────────────────

fn bench_session_frame(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let Ok((mut session, queues)) = Session::with_queues(FusionConfig::default(), 42) else {
        return;
    };
    let mut sink = NullSink;
    let expressions = RawSignal::Expressions(fearful());
    let landmarks = RawSignal::Hand(hand());
    let mut now = 0.0;

    c.bench_function("session_frame_60hz", |b| {
        b.iter(|| {
            now += 16.0;
            queues.emotion.push_raw(expressions.clone());
            queues.gesture.push_raw(landmarks.clone());
            session.push_touch(now % 1280.0, 360.0, None);
            session.advance(black_box(now), &mut sink);
        })
    });
}

criterion_group!(
    benches,
    bench_combine,
    bench_emotion_score,
    bench_emotion_normalize,
    bench_gesture_normalize,
    bench_assess_and_animate,
    bench_session_frame,
);
criterion_main!(benches);
