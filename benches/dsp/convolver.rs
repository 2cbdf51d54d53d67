//! Benchmarks for the partitioned FFT convolver.
//!
//! Per-sample cost is flat except on partition boundaries, where the whole
//! impulse response is multiplied in; blocks of at least one partition
//! average that out.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumbus::dsp::convolver::{Convolver, DEFAULT_PARTITION_SIZE};
use drumbus::dsp::Noise;
use drumbus::effects::ImpulseResponse;

use crate::SAMPLE_RATE;

pub fn bench_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolver");
    let block = DEFAULT_PARTITION_SIZE * 2;

    let input: Vec<f32> = (0..block).map(|i| (i as f32 * 0.05).sin()).collect();

    for &seconds in &[0.25f32, 1.0, 2.0] {
        let mut ir = ImpulseResponse::synthetic(SAMPLE_RATE, seconds, 3.0, &mut Noise::seeded(1));
        ir.normalize(SAMPLE_RATE);
        let mut convolver = Convolver::new(&ir.left, &ir.right, DEFAULT_PARTITION_SIZE);

        let mut left = vec![0.0f32; block];
        let mut right = vec![0.0f32; block];
        group.bench_with_input(
            BenchmarkId::new("stereo_ir", format!("{}ms", (seconds * 1000.0) as u32)),
            &block,
            |b, _| {
                b.iter(|| {
                    for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
                        (*l, *r) = convolver.process(black_box(x));
                    }
                })
            },
        );
    }

    group.finish();
}
