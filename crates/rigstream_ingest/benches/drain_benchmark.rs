//! # Drain Benchmark
//!
//! Measures one scheduler tick over a large backlog, with and without
//! out-of-order frames.
//!
//! Run with: `cargo bench --package rigstream_ingest`

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rigstream_ingest::{
    AnnouncedCharacter, DrainBudgets, DrainScheduler, IngestConfig, NativeEventBridge, ReplayMode,
    SimulatedSource, SimulationScript, StreamConsumer, StreamSession,
};
use rigstream_shared::StreamManifest;

/// Joints per humanoid frame.
const JOINTS: usize = 20;

struct NullConsumer;

impl StreamConsumer for NullConsumer {
    fn spawn_character(&mut self, character: &AnnouncedCharacter) {
        black_box(character);
    }
}

fn loaded_session(characters: usize, frames: i32, early: usize) -> StreamSession {
    let t0 = Instant::now();
    let script = (0..characters).fold(SimulationScript::new(), |s, c| {
        s.character_with_early_frames(&format!("p{c}"), 0, frames - 1, JOINTS, early)
    });
    let mut session = StreamSession::new(&IngestConfig::default(), StreamManifest::default(), t0);
    let source = SimulatedSource::new(script, ReplayMode::Blocking);
    session
        .start(Box::new(source), "bench", t0)
        .expect("simulated source starts");
    session
}

fn bench_bridge_copy(c: &mut Criterion) {
    let bridge = NativeEventBridge::new(Arc::new(Default::default()), None);
    let rotations = vec![0.0f64; JOINTS * 4];
    let lengths = vec![0.1f64; JOINTS];
    let offsets = vec![0.0f64; JOINTS * 3];

    c.bench_function("bridge_on_frame_20_joints", |b| {
        b.iter(|| {
            bridge.on_frame("p1", 0, &[1.0, 2.0, 3.0], &rotations, &lengths, &offsets);
            black_box(bridge.queues().frames.drain_up_to(1));
        });
    });
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain_tick");

    for characters in [1usize, 10, 25] {
        group.bench_with_input(BenchmarkId::new("in_order", characters), &characters, |b, &n| {
            b.iter_batched(
                || loaded_session(n, 300, 0),
                |mut session| {
                    let mut sched = DrainScheduler::with_budgets(DrainBudgets::UNLIMITED, false);
                    sched.tick(&mut session, &mut NullConsumer, Instant::now());
                    session
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("early_frames", characters), &characters, |b, &n| {
            b.iter_batched(
                || loaded_session(n, 300, 30),
                |mut session| {
                    let mut sched = DrainScheduler::new(&IngestConfig::default());
                    for _ in 0..4 {
                        sched.tick(&mut session, &mut NullConsumer, Instant::now());
                    }
                    session
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bridge_copy, bench_drain);
criterion_main!(benches);
