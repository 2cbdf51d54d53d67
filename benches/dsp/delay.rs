//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumbus::dsp::delay::DelayLine;
use drumbus::effects::FeedbackDelay;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Test with different delay times (in samples)
    let delay_times: &[usize] = &[
        480,   // 10ms at 48kHz
        4800,  // 100ms at 48kHz
        47999, // just under 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        // Generate a test signal
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &delay_samples in delay_times {
            let delay_ms = delay_samples as f32 / 48.0;

            let mut delay = DelayLine::new(1.0, SAMPLE_RATE);
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(format!("render_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        delay.render(black_box(&mut buffer), black_box(delay_samples));
                    })
                },
            );
        }

        // Feedback delay at the stability limit
        let mut delay = FeedbackDelay::new(1.0, SAMPLE_RATE);
        delay.set_time(0.25);
        delay.set_feedback(0.95);
        delay.set_mix(0.5);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("feedback", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    *out = delay.process(black_box(x));
                }
            })
        });
    }

    group.finish();
}
