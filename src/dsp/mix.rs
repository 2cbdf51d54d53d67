//! Dry/wet crossfade laws shared by the effects.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Dry/Wet Crossfading
===================

Every effect on the master bus blends the unprocessed signal (dry) with its
own output (wet). A single control value picks the blend:

  mix = 0.0  →  100% dry
  mix = 1.0  →  100% wet

How the two gains follow `mix` is the crossfade law.


Linear
------

    dry = 1.0 - mix
    wet = mix

The gains always sum to 1.0, so a signal that is identical on both paths
comes out at the same level. Reverb and delay use this: their wet path is a
smeared copy of the dry one and the loudness dip in the middle is masked.

    Level
      1.0 ──────╲      ╱──────
                 ╲    ╱
      0.5         ╲  ╱  ← loudness dip here
                   ╲╱
      0.0 ─────────────────────
          0.0     0.5     1.0
                  mix


Equal-Power
-----------

    dry = sqrt(1.0 - mix)        or  cos(mix × π/2)
    wet = sqrt(mix)              or  sin(mix × π/2)

Here the POWERS sum to 1.0:

    dry² + wet² = (1 - mix) + mix = 1

At mix = 0.5 both paths sit at ~70.7% (√0.5). A phaser needs this: its wet
path is the dry signal with shifted phase, and summing the two at 50% each
cancels whole frequency bands, which sounds like the effect "dropping out"
mid-sweep. Keeping the total power constant hides that.

Both forms keep the powers summed to 1.0; we use the square-root one.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossfade {
    Linear,
    EqualPower,
}

impl Crossfade {
    /// `(dry, wet)` gains for `mix`, clamped to 0.0..=1.0.
    #[inline]
    pub fn gains(self, mix: f32) -> (f32, f32) {
        let mix = if mix.is_nan() { 0.0 } else { mix.clamp(0.0, 1.0) };
        match self {
            Crossfade::Linear => (1.0 - mix, mix),
            Crossfade::EqualPower => ((1.0 - mix).sqrt(), mix.sqrt()),
        }
    }

    /// Blend one dry and one wet sample.
    #[inline]
    pub fn blend(self, dry: f32, wet: f32, mix: f32) -> f32 {
        let (dry_gain, wet_gain) = self.gains(mix);
        dry * dry_gain + wet * wet_gain
    }
}
