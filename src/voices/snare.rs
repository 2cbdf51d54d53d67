//! Snare drum voice.
//!
//! Mostly noise for the wires, with two low tones for the shell and a
//! 1kHz partial for the stick snap.
//!
//! The tone filter is a bell at 1kHz: tone above 0.5 brightens the snap,
//! below 0.5 scoops it.

use std::f32::consts::TAU;

use super::{InstrumentSpec, ToneFilter, ToneShape, VoiceCtx};
use crate::sequencing::InstrumentSettings;

pub(super) const SPEC: InstrumentSpec = InstrumentSpec {
    name: "snare",
    partials: signal,
    release_rate: 5.0,
    output_gain: 0.6,
    tone_filter: ToneFilter {
        shape: ToneShape::Peaking,
        base_hz: 1000.0,
    },
    defaults: InstrumentSettings::new(0.001, 0.15, 0.0, 0.25, 0.8),
};

fn signal(t: f32, ctx: &mut VoiceCtx) -> f32 {
    let wires = ctx.noise() * 0.7;
    let body = (TAU * 220.0 * t).sin() * 0.4 + (TAU * 150.0 * t).sin() * 0.3;
    let snap = (TAU * 1000.0 * t).sin() * 0.2;
    wires + body + snap
}
