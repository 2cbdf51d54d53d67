//! Benchmarks for one-shot voice synthesis.
//!
//! A full hit is rendered up front when a step is scheduled, so the number
//! that matters is the cost of one whole buffer, per instrument.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use drumbus::dsp::Noise;
use drumbus::voices::{synthesize, Instrument};

use crate::SAMPLE_RATE;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let mut noise = Noise::seeded(1);

    for instrument in Instrument::ALL {
        let settings = instrument.spec().defaults;
        group.bench_with_input(
            BenchmarkId::new("synthesize", instrument.name()),
            &instrument,
            |b, &instrument| {
                b.iter(|| {
                    synthesize(
                        black_box(instrument),
                        black_box(&settings),
                        SAMPLE_RATE,
                        &mut noise,
                    )
                })
            },
        );
    }

    group.finish();
}
