//! The master effects bus: feedback delay, phaser, convolution reverb.
//!
//! ```text
//! voices ─→ master gain ─→ delay ─→ phaser ─→ reverb ─┬─→ left
//!                                                     └─→ right
//! ```
//!
//! The chain is built once per session. Parameter changes land at the next
//! rendered block, unsmoothed; a large jump in delay time can click.

use std::fmt;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::dsp::Noise;
use crate::error::{EngineError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod delay;
pub mod phaser;
pub mod reverb;

pub use delay::FeedbackDelay;
pub use phaser::Phaser;
pub use reverb::{ConvolutionReverb, ImpulseResponse};

/// Longest delay time a user can dial in, in seconds.
pub const MAX_DELAY_TIME: f32 = 1.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    pub reverb_mix: f32,
    pub delay_time: f32,
    pub delay_feedback: f32,
    pub delay_mix: f32,
    pub phaser_rate: f32,
    pub phaser_depth: f32,
    pub phaser_mix: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            reverb_mix: 0.2,
            delay_time: 0.25,
            delay_feedback: 0.3,
            delay_mix: 0.0,
            phaser_rate: 0.5,
            phaser_depth: 0.5,
            phaser_mix: 0.0,
        }
    }
}

impl EffectParams {
    pub fn get(&self, param: EffectParam) -> f32 {
        match param {
            EffectParam::ReverbMix => self.reverb_mix,
            EffectParam::DelayTime => self.delay_time,
            EffectParam::DelayFeedback => self.delay_feedback,
            EffectParam::DelayMix => self.delay_mix,
            EffectParam::PhaserRate => self.phaser_rate,
            EffectParam::PhaserDepth => self.phaser_depth,
            EffectParam::PhaserMix => self.phaser_mix,
        }
    }

    /// Set `param`, clamped into range. NaN maps to the lower bound.
    ///
    /// Delay feedback of 1.0 or more is refused: the echoes would never
    /// decay. Values just under 1.0 are pulled down to 0.95.
    pub fn set(&mut self, param: EffectParam, value: f32) -> Result<()> {
        match param {
            EffectParam::ReverbMix => self.reverb_mix = clamp(value, 0.0, reverb::MAX_MIX),
            EffectParam::DelayTime => {
                self.delay_time = clamp(value, delay::MIN_DELAY_SECONDS, MAX_DELAY_TIME)
            }
            EffectParam::DelayFeedback => {
                if value >= 1.0 {
                    return Err(EngineError::UnstableFeedback(value));
                }
                self.delay_feedback = clamp(value, 0.0, delay::MAX_FEEDBACK);
            }
            EffectParam::DelayMix => self.delay_mix = clamp(value, 0.0, 1.0),
            EffectParam::PhaserRate => self.phaser_rate = clamp(value, 0.1, 5.0),
            EffectParam::PhaserDepth => self.phaser_depth = clamp(value, 0.0, 1.0),
            EffectParam::PhaserMix => self.phaser_mix = clamp(value, 0.0, 1.0),
        }
        Ok(())
    }
}

#[inline]
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectParam {
    ReverbMix,
    DelayTime,
    DelayFeedback,
    DelayMix,
    PhaserRate,
    PhaserDepth,
    PhaserMix,
}

impl EffectParam {
    pub const ALL: [EffectParam; 7] = [
        EffectParam::ReverbMix,
        EffectParam::DelayTime,
        EffectParam::DelayFeedback,
        EffectParam::DelayMix,
        EffectParam::PhaserRate,
        EffectParam::PhaserDepth,
        EffectParam::PhaserMix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectParam::ReverbMix => "reverbMix",
            EffectParam::DelayTime => "delayTime",
            EffectParam::DelayFeedback => "delayFeedback",
            EffectParam::DelayMix => "delayMix",
            EffectParam::PhaserRate => "phaserRate",
            EffectParam::PhaserDepth => "phaserDepth",
            EffectParam::PhaserMix => "phaserMix",
        }
    }
}

impl fmt::Display for EffectParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `reverbMix`, `reverb_mix`, `REVERB_MIX`, ...
impl FromStr for EffectParam {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let fold = |name: &str| -> String {
            name.chars()
                .filter(|c| *c != '_' && *c != '-')
                .map(|c| c.to_ascii_lowercase())
                .collect()
        };
        let wanted = fold(s.trim());
        EffectParam::ALL
            .into_iter()
            .find(|param| fold(param.name()) == wanted)
            .ok_or_else(|| EngineError::UnknownParam(s.to_string()))
    }
}

/// Master gain plus the three effects, in series.
pub struct EffectsChain {
    gain: f32,
    delay: FeedbackDelay,
    phaser: Phaser,
    reverb: ConvolutionReverb,
    params: EffectParams,
}

impl EffectsChain {
    /// Build the chain and its impulse response for `config`.
    pub fn new(config: &EngineConfig, noise: &mut Noise) -> Self {
        let sample_rate = config.sample_rate;
        let mut impulse = ImpulseResponse::synthetic(
            sample_rate,
            config.reverb_seconds,
            config.reverb_decay,
            noise,
        );
        impulse.normalize(sample_rate);

        let mut chain = Self {
            gain: config.master_gain,
            delay: FeedbackDelay::new(config.max_delay_seconds, sample_rate),
            phaser: Phaser::new(sample_rate),
            reverb: ConvolutionReverb::new(&impulse),
            params: EffectParams::default(),
        };
        chain.set_params(&EffectParams::default());

        tracing::debug!(
            sample_rate,
            impulse_len = chain.reverb.impulse_len(),
            "effects chain ready"
        );
        chain
    }

    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    pub fn set_params(&mut self, params: &EffectParams) {
        self.delay.set_time(params.delay_time);
        self.delay.set_feedback(params.delay_feedback);
        self.delay.set_mix(params.delay_mix);
        self.phaser.set_rate(params.phaser_rate);
        self.phaser.set_depth(params.phaser_depth);
        self.phaser.set_mix(params.phaser_mix);
        self.reverb.set_mix(params.reverb_mix);
        self.params = *params;
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    pub fn reverb(&self) -> &ConvolutionReverb {
        &self.reverb
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let x = input * self.gain;
        let x = self.delay.process(x);
        let x = self.phaser.process(x);
        self.reverb.process(x)
    }

    /// Process a mono block into stereo.
    pub fn render(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(input.len(), left.len());
        debug_assert_eq!(input.len(), right.len());

        for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            (*l, *r) = self.process(x);
        }
    }

    pub fn reset(&mut self) {
        self.delay.reset();
        self.phaser.reset();
        self.reverb.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EngineConfig {
        EngineConfig::default()
            .with_sample_rate(8_000.0)
            .with_reverb(0.25, 3.0)
    }

    #[test]
    fn test_defaults() {
        let params = EffectParams::default();
        assert_eq!(params.reverb_mix, 0.2);
        assert_eq!(params.delay_time, 0.25);
        assert_eq!(params.delay_feedback, 0.3);
        assert_eq!(params.delay_mix, 0.0);
        assert_eq!(params.phaser_mix, 0.0);
    }

    #[test]
    fn test_feedback_rules() {
        let mut params = EffectParams::default();
        assert!(params.set(EffectParam::DelayFeedback, 0.95).is_ok());
        assert_eq!(params.delay_feedback, 0.95);

        assert_eq!(
            params.set(EffectParam::DelayFeedback, 1.0),
            Err(EngineError::UnstableFeedback(1.0))
        );
        assert!(params.set(EffectParam::DelayFeedback, f32::INFINITY).is_err());
        // Rejected values leave the old one in place
        assert_eq!(params.delay_feedback, 0.95);

        params.set(EffectParam::DelayFeedback, 0.99).unwrap();
        assert_eq!(params.delay_feedback, 0.95);
        params.set(EffectParam::DelayFeedback, -0.5).unwrap();
        assert_eq!(params.delay_feedback, 0.0);
        params.set(EffectParam::DelayFeedback, f32::NAN).unwrap();
        assert_eq!(params.delay_feedback, 0.0);
    }

    #[test]
    fn test_ranges() {
        let mut params = EffectParams::default();
        params.set(EffectParam::ReverbMix, 1.0).unwrap();
        assert_eq!(params.reverb_mix, 0.8);
        params.set(EffectParam::DelayTime, 0.01).unwrap();
        assert_eq!(params.delay_time, 0.0625);
        params.set(EffectParam::DelayTime, 3.0).unwrap();
        assert_eq!(params.delay_time, MAX_DELAY_TIME);
        params.set(EffectParam::PhaserRate, 9.0).unwrap();
        assert_eq!(params.phaser_rate, 5.0);
        params.set(EffectParam::PhaserMix, f32::NAN).unwrap();
        assert_eq!(params.phaser_mix, 0.0);
    }

    #[test]
    fn test_parse_param_names() {
        assert_eq!("reverbMix".parse(), Ok(EffectParam::ReverbMix));
        assert_eq!("reverb_mix".parse(), Ok(EffectParam::ReverbMix));
        assert_eq!("DELAY_FEEDBACK".parse(), Ok(EffectParam::DelayFeedback));
        assert_eq!("phaserDepth".parse(), Ok(EffectParam::PhaserDepth));
        assert!("chorusMix".parse::<EffectParam>().is_err());
        for param in EffectParam::ALL {
            assert_eq!(param.to_string().parse(), Ok(param));
        }
    }

    #[test]
    fn test_chain_silence_in_silence_out() {
        let mut chain = EffectsChain::new(&small_config(), &mut Noise::seeded(1));
        let input = vec![0.0; 4_096];
        let mut left = vec![1.0; 4_096];
        let mut right = vec![1.0; 4_096];
        chain.render(&input, &mut left, &mut right);
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
    }

    #[test]
    fn test_chain_dry_path_at_zero_mixes() {
        let mut chain = EffectsChain::new(&small_config(), &mut Noise::seeded(1));
        let mut params = EffectParams::default();
        params.set(EffectParam::ReverbMix, 0.0).unwrap();
        chain.set_params(&params);

        for i in 0..1_000 {
            let x = (i as f32 * 0.02).sin() * 0.5;
            let (l, r) = chain.process(x);
            assert_eq!(l, x);
            assert_eq!(r, x);
        }
    }

    #[test]
    fn test_reverb_adds_tail() {
        let mut chain = EffectsChain::new(&small_config(), &mut Noise::seeded(1));
        let mut params = EffectParams::default();
        params.set(EffectParam::ReverbMix, 0.8).unwrap();
        chain.set_params(&params);

        chain.process(1.0);
        let tail: f32 = (0..1_500).map(|_| chain.process(0.0).0.abs()).sum();
        assert!(tail > 0.0);
    }
}
