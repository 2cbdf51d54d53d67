//! Benchmarks for state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumbus::dsp::filter::SVFilter;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        let filters = [
            ("lowpass", SVFilter::lowpass(1000.0, SAMPLE_RATE)),
            ("highpass", SVFilter::highpass(1000.0, SAMPLE_RATE)),
            ("peaking", SVFilter::peaking(1000.0, 6.0, SAMPLE_RATE)),
            ("allpass", SVFilter::allpass(1000.0, SAMPLE_RATE)),
        ];

        for (name, mut filter) in filters {
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer));
                })
            });
        }

        // Sweeping cutoff every 16 samples, as the phaser does
        let mut filter = SVFilter::allpass(440.0, SAMPLE_RATE);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("allpass_sweep", size), &size, |b, _| {
            b.iter(|| {
                for (i, chunk) in buffer.chunks_mut(16).enumerate() {
                    filter.set_cutoff(440.0 + (i % 32) as f32 * 25.0);
                    filter.render(black_box(chunk));
                }
            })
        });
    }

    group.finish();
}
