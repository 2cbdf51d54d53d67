//! Open hi-hat voice.
//!
//! Two independent noise layers plus three inharmonic high partials for
//! the metallic ring. A high-pass at 5kHz keeps it out of the way of the
//! kick and snare; tone slides that cutoff between 2.5kHz and 10kHz.

use std::f32::consts::TAU;

use super::{InstrumentSpec, ToneFilter, ToneShape, VoiceCtx};
use crate::sequencing::InstrumentSettings;

pub(super) const SPEC: InstrumentSpec = InstrumentSpec {
    name: "openhat",
    partials: signal,
    release_rate: 8.0,
    output_gain: 0.4,
    tone_filter: ToneFilter {
        shape: ToneShape::HighPass,
        base_hz: 5000.0,
    },
    defaults: InstrumentSettings::new(0.001, 0.05, 0.3, 0.4, 0.6),
};

fn signal(t: f32, ctx: &mut VoiceCtx) -> f32 {
    let hiss = ctx.noise() * 0.6;
    let metal = (TAU * 3500.0 * t).sin() * 0.3
        + (TAU * 7000.0 * t).sin() * 0.2
        + (TAU * 12000.0 * t).sin() * 0.15;
    let sizzle = ctx.noise() * 0.4;
    hiss + metal + sizzle
}
