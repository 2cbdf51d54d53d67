//! Cowbell voice.
//!
//! Three partials at 560, 845 and 1300Hz. The ratios are deliberately
//! inharmonic, which is what makes it read as struck metal rather than a
//! chord. A little noise roughens the attack.

use std::f32::consts::TAU;

use super::{InstrumentSpec, ToneFilter, ToneShape, VoiceCtx};
use crate::sequencing::InstrumentSettings;

pub(super) const SPEC: InstrumentSpec = InstrumentSpec {
    name: "cowbell",
    partials: signal,
    release_rate: 6.0,
    output_gain: 0.5,
    tone_filter: ToneFilter {
        shape: ToneShape::Peaking,
        base_hz: 1000.0,
    },
    defaults: InstrumentSettings::new(0.001, 0.12, 0.4, 0.5, 0.6),
};

fn signal(t: f32, ctx: &mut VoiceCtx) -> f32 {
    (TAU * 560.0 * t).sin()
        + (TAU * 845.0 * t).sin() * 0.8
        + (TAU * 1300.0 * t).sin() * 0.6
        + ctx.noise() * 0.1
}
