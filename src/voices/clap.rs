//! Hand clap voice.
//!
//! A real clap is several hands landing a few milliseconds apart. We fake
//! it by gating noise through three bursts of falling level:
//!
//! ```text
//!   gain
//!   1.0 ┤████
//!   0.7 ┤    ██████
//!   0.5 ┤          ██████
//!   0.0 ┼────┬─────┬─────┬──────→ t
//!        0  10ms  25ms  40ms
//! ```
//!
//! After 40ms the clap is silent no matter how long the envelope runs;
//! a longer release only matters through the reverb.

use super::{InstrumentSpec, ToneFilter, ToneShape, VoiceCtx};
use crate::sequencing::InstrumentSettings;

pub(super) const SPEC: InstrumentSpec = InstrumentSpec {
    name: "clap",
    partials: signal,
    release_rate: 8.0,
    output_gain: 0.6,
    tone_filter: ToneFilter {
        shape: ToneShape::Peaking,
        base_hz: 1000.0,
    },
    defaults: InstrumentSettings::new(0.001, 0.08, 0.1, 0.3, 0.7),
};

/// Burst gate. The instants between bursts are silent.
fn bursts(t: f32) -> f32 {
    if t < 0.01 {
        1.0
    } else if t > 0.01 && t < 0.025 {
        0.7
    } else if t > 0.025 && t < 0.04 {
        0.5
    } else {
        0.0
    }
}

fn signal(t: f32, ctx: &mut VoiceCtx) -> f32 {
    ctx.noise() * 0.8 * bursts(t)
}
