use crate::MIN_TIME;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
ADSR Envelope Implementation
============================

Every drum voice is rendered as a finished buffer, so the envelope here is a
pure function of elapsed time rather than a gated state machine. There is no
note-off: a drum hit runs attack, then decay, then release, and the buffer
ends when the release budget is spent.

Vocabulary
----------

  t             Seconds since the voice started (sample index / sample_rate).

  sustain       Not a hold level here - it is the floor the decay ramps down
                to and the level the release tail starts from.

  release rate  Instrument-specific constant `k`. The release tail is an
                exponential `exp(-x * k / release)`; bigger `k` = snappier.


The Shape
---------

  Level
    1.0 ┐  ╱╲
        │ ╱  ╲
    S   │╱    ╲___
        │         ‾‾‾──___
    0.0 └──────────────────‾‾──→ t
        Attack Decay  Release (exponential, never reaches 0)
         (A)    (D)       (R)

Attack and decay are linear ramps. Release is exponential and asymptotic:
it never reaches exactly zero inside the buffer, the buffer length
(A + D + R seconds) truncates it.


Zero-Length Stages
------------------

A stage shorter than one sample at 48kHz is treated as zero:

  attack == 0   level is 1.0 at t = 0 (the peak is instantaneous)
  decay  == 0   level jumps straight to sustain
  release == 0  level is sustain at the release onset, 0 afterwards

No stage ever divides by its own duration unless that duration is non-zero.
*/

/// Attack/decay/sustain/release shape of a one-shot voice.
///
/// Durations are in seconds, `sustain` is a level in 0.0..=1.0.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Total length of the voice in seconds.
    pub fn duration(&self) -> f32 {
        self.attack + self.decay + self.release
    }

    /// Number of samples a voice with this shape occupies.
    ///
    /// Computed in f64 so `round(sample_rate * duration)` is exact for the
    /// durations a user can dial in.
    pub fn sample_count(&self, sample_rate: f32) -> usize {
        let duration = self.attack as f64 + self.decay as f64 + self.release as f64;
        (sample_rate as f64 * duration).round().max(0.0) as usize
    }

    /// Amplitude at `t` seconds after onset.
    pub fn amplitude(&self, t: f32, release_rate: f32) -> f32 {
        if t < 0.0 {
            return 0.0;
        }

        let attack = effective(self.attack);
        let decay = effective(self.decay);
        let release = effective(self.release);
        let sustain = self.sustain;

        // Instant attack: the first sample is the peak
        if attack == 0.0 && t == 0.0 {
            return 1.0;
        }

        if t < attack {
            return t / attack;
        }

        if t < attack + decay {
            let progress = (t - attack) / decay;
            return 1.0 - (1.0 - sustain) * progress;
        }

        let elapsed = t - attack - decay;
        if release == 0.0 {
            return if elapsed <= 0.0 { sustain } else { 0.0 };
        }

        sustain * (-elapsed * release_rate / release).exp()
    }

    /// Render the envelope into `buffer`, one value per sample.
    pub fn render(&self, buffer: &mut [f32], sample_rate: f32, release_rate: f32) {
        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = i as f32 / sample_rate;
            *sample = self.amplitude(t, release_rate);
        }
    }
}

/// Stage durations below one sample count as zero.
#[inline]
fn effective(duration: f32) -> f32 {
    if duration > MIN_TIME {
        duration
    } else {
        0.0
    }
}
