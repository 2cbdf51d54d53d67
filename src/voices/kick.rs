//! Kick drum voice.
//!
//! An 808-style kick: a sine whose pitch falls from 65Hz toward 35Hz over
//! the first few hundred milliseconds, thickened with a sub-octave, the
//! second harmonic and a tanh-saturated copy of the fundamental.
//!
//! # How It Works
//!
//! 1. Pitch sweep `f(t) = 65·e^(-2.5t) + 35·(1 - e^(-2.5t))`
//! 2. Fundamental `sin(2πft)` is the body
//! 3. `sin(πft)` adds sub weight, `sin(4πft)` adds knock
//! 4. `tanh(2·sin(2πft))` squares the wave off a little for punch
//! 5. With a near-instant attack, a 200Hz blip that dies within a few
//!    milliseconds gives the beater click
//!
//! The tone filter is a low-pass around 80Hz, so turning tone down trims
//! the harmonics and leaves mostly sub.

use std::f32::consts::PI;

use super::{InstrumentSpec, ToneFilter, ToneShape, VoiceCtx};
use crate::sequencing::InstrumentSettings;

const START_HZ: f32 = 65.0;
const END_HZ: f32 = 35.0;
const SWEEP_RATE: f32 = 2.5;

/// Attacks at or below this get the beater click.
const CLICK_MAX_ATTACK: f32 = 0.005;

pub(super) const SPEC: InstrumentSpec = InstrumentSpec {
    name: "kick",
    partials: signal,
    release_rate: 3.0,
    output_gain: 0.9,
    tone_filter: ToneFilter {
        shape: ToneShape::LowPass,
        base_hz: 80.0,
    },
    defaults: InstrumentSettings::new(0.001, 0.3, 0.2, 0.8, 0.9),
};

fn signal(t: f32, ctx: &mut VoiceCtx) -> f32 {
    let sweep = (-t * SWEEP_RATE).exp();
    let freq = START_HZ * sweep + END_HZ * (1.0 - sweep);
    let phase = 2.0 * PI * freq * t;

    let fundamental = phase.sin();
    let sub = (phase * 0.5).sin() * 0.35;
    let harmonic = (phase * 2.0).sin() * 0.3;
    let drive = (fundamental * 2.0).tanh() * 0.4;

    let click = if ctx.settings.attack <= CLICK_MAX_ATTACK {
        (2.0 * PI * 200.0 * t).sin() * (-t * 200.0).exp() * 0.3
    } else {
        0.0
    };

    fundamental + sub + harmonic + drive + click
}
