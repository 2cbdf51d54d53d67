//! Benchmarks for the one-shot ADSR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumbus::dsp::Adsr;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let env = Adsr::new(0.001, 0.3, 0.2, 0.8);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        group.bench_with_input(BenchmarkId::new("render", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), SAMPLE_RATE, black_box(3.0));
            })
        });

        // Point evaluation in the release tail (exp per sample)
        group.bench_with_input(BenchmarkId::new("release_tail", size), &size, |b, _| {
            b.iter(|| {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let t = 0.5 + i as f32 / SAMPLE_RATE;
                    *sample = env.amplitude(black_box(t), 3.0);
                }
            })
        });
    }

    group.finish();
}
