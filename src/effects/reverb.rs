//! Convolution reverb over a synthetic impulse response.
//!
//! A real room's impulse response is a dense burst of reflections that dies
//! away. Shaped noise is a surprisingly good stand-in:
//!
//! ```text
//! ir[i] = noise · (1 - i/len)^decay        (independent noise per channel)
//!
//!   |▓▓▓▓▓▓▓▓▒▒▒▒▒▒░░░░░░░·····        |
//!   0                                  len = round(sample_rate × seconds)
//! ```
//!
//! Independent noise in the two channels is what makes the tail wide. The
//! response is built once per session; changing the mix never rebuilds it.
//!
//! # Normalization
//!
//! The raw response is scaled the way Web Audio's `ConvolverNode` does it, so
//! the wet level is roughly independent of length and sample rate:
//!
//! ```text
//! power = sqrt(Σ ir² / (channels · len))          floored at 0.000125
//! scale = (1 / power) · 0.00125 · (44100 / sample_rate)
//! ```
//!
//! # Latency
//!
//! The partitioned convolver runs one partition behind, so the wet signal
//! trails the dry one by `DEFAULT_PARTITION_SIZE` samples (~12ms at 44.1kHz).
//! It reads as a short pre-delay.

use crate::dsp::convolver::{Convolver, DEFAULT_PARTITION_SIZE};
use crate::dsp::{Crossfade, Noise};

/// Mix ceiling; past this the kit drowns.
pub const MAX_MIX: f32 = 0.8;

const MIN_POWER: f32 = 0.000125;
const GAIN_CALIBRATION: f32 = 0.00125;
const CALIBRATION_SAMPLE_RATE: f32 = 44_100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl ImpulseResponse {
    /// Decaying stereo noise, `round(sample_rate × seconds)` samples per channel.
    pub fn synthetic(sample_rate: f32, seconds: f32, decay: f32, noise: &mut Noise) -> Self {
        let len = (sample_rate as f64 * seconds.max(0.0) as f64).round() as usize;
        let mut channel = || -> Vec<f32> {
            (0..len)
                .map(|i| {
                    let remaining = 1.0 - i as f32 / len as f32;
                    noise.sample() * remaining.powf(decay)
                })
                .collect()
        };
        let left = channel();
        let right = channel();
        Self { left, right }
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Scale factor that normalizes this response at `sample_rate`.
    pub fn normalization(&self, sample_rate: f32) -> f32 {
        let samples = self.left.len() + self.right.len();
        if samples == 0 {
            return 1.0;
        }

        let energy: f64 = self
            .left
            .iter()
            .chain(&self.right)
            .map(|&s| (s as f64) * (s as f64))
            .sum();
        let power = ((energy / samples as f64).sqrt() as f32).max(MIN_POWER);

        (1.0 / power) * GAIN_CALIBRATION * (CALIBRATION_SAMPLE_RATE / sample_rate)
    }

    pub fn normalize(&mut self, sample_rate: f32) {
        let scale = self.normalization(sample_rate);
        for sample in self.left.iter_mut().chain(self.right.iter_mut()) {
            *sample *= scale;
        }
    }
}

pub struct ConvolutionReverb {
    convolver: Convolver,
    impulse_len: usize,
    mix: f32,
}

impl ConvolutionReverb {
    /// Takes the response as given; call `normalize` first if wanted.
    pub fn new(impulse: &ImpulseResponse) -> Self {
        Self {
            convolver: Convolver::new(&impulse.left, &impulse.right, DEFAULT_PARTITION_SIZE),
            impulse_len: impulse.len(),
            mix: 0.2,
        }
    }

    /// Samples per channel of the loaded impulse response.
    pub fn impulse_len(&self) -> usize {
        self.impulse_len
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = if mix.is_nan() { 0.0 } else { mix.clamp(0.0, MAX_MIX) };
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Mono in, stereo out.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let (wet_left, wet_right) = self.convolver.process(input);
        let (dry, wet) = Crossfade::Linear.gains(self.mix);
        (input * dry + wet_left * wet, input * dry + wet_right * wet)
    }

    pub fn reset(&mut self) {
        self.convolver.reset();
    }
}
