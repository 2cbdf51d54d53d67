//! Benchmarks for the master bus: voice mixing plus the effects chain.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumbus::effects::{EffectParam, EffectParams};
use drumbus::engine::{channel, SharedClock};
use drumbus::{EngineConfig, Instrument};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bus");
    let config = EngineConfig::default()
        .with_sample_rate(SAMPLE_RATE)
        .with_seed(1);

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        // === IDLE ===
        // No voices, every effect running: the floor cost of the chain
        let (_router, mut bus) = channel(&config, SharedClock::new(SAMPLE_RATE));
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| {
                bus.render(black_box(&mut left), black_box(&mut right));
            })
        });

        // === FULL KIT ===
        // One hit of every instrument, delay and phaser in, re-queued as the
        // voices finish so the mix never empties
        let (mut router, mut bus) = channel(&config, SharedClock::new(SAMPLE_RATE));
        let mut params = EffectParams::default();
        let _ = params.set(EffectParam::DelayMix, 0.3);
        let _ = params.set(EffectParam::PhaserMix, 0.5);
        let _ = router.update_effects(&params);

        group.bench_with_input(BenchmarkId::new("full_kit", size), &size, |b, _| {
            b.iter(|| {
                if bus.active_voices() < Instrument::COUNT {
                    let now = bus.clock().frames() as f64 / SAMPLE_RATE as f64;
                    for instrument in Instrument::ALL {
                        let _ = router.route(instrument, &instrument.spec().defaults, now);
                    }
                }
                bus.render(black_box(&mut left), black_box(&mut right));
            })
        });
    }

    group.finish();
}
