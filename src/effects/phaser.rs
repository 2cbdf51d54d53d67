use std::f32::consts::TAU;

use crate::dsp::{Crossfade, SVFilter};

/*
Phaser
======

An all-pass filter keeps every frequency's level but delays its phase, by
180° at the centre frequency. Mix that back with the dry signal and the
frequencies that came out inverted cancel: a notch. Six stages give several
notches, and sweeping all the centres with one LFO makes them glide.

  in ──┬────────────────────────────────────────────── dry ──→ (+) → out
       │                                                        ▲
       └→ (+) → [AP 440] → [AP 880] → ... → [AP 2640] ──┬─ wet ─┘
           ▲                                            │
           └──────────── × 0.7 (one sample later) ◄─────┘

  centre_i(t) = base_i + sin(2π · rate · t) · depth · 800 Hz

clamped to 10Hz .. 0.45 × sample rate so no stage ever lands on DC or
Nyquist. The feedback deepens the notches; it is taken from the previous
sample's output so the loop is computable, and at 0.7 it can't run away
because each stage has unit gain.

Recomputing six sets of filter coefficients every sample is wasted work for
a sweep of a few Hz, so the LFO updates the stages every CONTROL_INTERVAL
samples.

The wet path sums with the dry one at equal power; see `dsp::mix`.
*/

pub const STAGE_FREQUENCIES: [f32; 6] = [440.0, 880.0, 1320.0, 1760.0, 2200.0, 2640.0];
pub const SWEEP_HZ: f32 = 800.0;
pub const FEEDBACK: f32 = 0.7;

const CONTROL_INTERVAL: u32 = 16;
const MIN_CENTRE_HZ: f32 = 10.0;
const MAX_CENTRE_RATIO: f32 = 0.45;

#[derive(Debug, Clone)]
pub struct Phaser {
    stages: [SVFilter; 6],
    sample_rate: f32,
    lfo_phase: f32,
    rate: f32,
    depth: f32,
    mix: f32,
    last_output: f32,
    countdown: u32,
}

impl Phaser {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stages: STAGE_FREQUENCIES.map(|freq| SVFilter::allpass(freq, sample_rate)),
            sample_rate,
            lfo_phase: 0.0,
            rate: 0.5,
            depth: 0.5,
            mix: 0.0,
            last_output: 0.0,
            countdown: 0,
        }
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.max(0.0);
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
    }

    /// `(dry, wet)` gains at the current mix.
    pub fn gains(&self) -> (f32, f32) {
        Crossfade::EqualPower.gains(self.mix)
    }

    /// Centre frequency of `stage` for an LFO value in -1..=1.
    pub fn centre(&self, stage: usize, lfo: f32) -> f32 {
        let max = self.sample_rate * MAX_CENTRE_RATIO;
        (STAGE_FREQUENCIES[stage] + lfo * self.depth * SWEEP_HZ).clamp(MIN_CENTRE_HZ, max)
    }

    fn update_stages(&mut self) {
        let lfo = self.lfo_phase.sin();
        for stage in 0..self.stages.len() {
            let centre = self.centre(stage, lfo);
            self.stages[stage].set_cutoff(centre);
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.countdown == 0 {
            self.update_stages();
            self.countdown = CONTROL_INTERVAL;
        }
        self.countdown -= 1;

        self.lfo_phase += TAU * self.rate / self.sample_rate;
        if self.lfo_phase >= TAU {
            self.lfo_phase -= TAU;
        }

        let mut wet = input + self.last_output * FEEDBACK;
        for stage in self.stages.iter_mut() {
            wet = stage.process(wet);
        }
        self.last_output = wet;

        Crossfade::EqualPower.blend(input, wet, self.mix)
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
        self.last_output = 0.0;
        self.lfo_phase = 0.0;
        self.countdown = 0;
    }
}
