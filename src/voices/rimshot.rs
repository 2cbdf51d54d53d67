//! Rimshot voice.
//!
//! A sharp 2kHz crack over a 400Hz body, with noise for the stick. The
//! release rate is the fastest of the kit (k = 15), so even a long release
//! setting stays tight.

use std::f32::consts::TAU;

use super::{InstrumentSpec, ToneFilter, ToneShape, VoiceCtx};
use crate::sequencing::InstrumentSettings;

pub(super) const SPEC: InstrumentSpec = InstrumentSpec {
    name: "rimshot",
    partials: signal,
    release_rate: 15.0,
    output_gain: 0.7,
    tone_filter: ToneFilter {
        shape: ToneShape::Peaking,
        base_hz: 1000.0,
    },
    defaults: InstrumentSettings::new(0.001, 0.03, 0.0, 0.15, 0.8),
};

fn signal(t: f32, ctx: &mut VoiceCtx) -> f32 {
    (TAU * 2000.0 * t).sin() * 0.6 + (TAU * 400.0 * t).sin() * 0.3 + ctx.noise() * 0.4
}
