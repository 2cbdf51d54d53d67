//! The six drum voices and the registry that describes them.
//!
//! Every voice is a one-shot: a pure signal function of time (plus noise
//! draws), shaped by the instrument's ADSR and rendered into a finished
//! buffer. Nothing here knows about patterns or the master bus; the router
//! asks for a buffer and a tone filter and takes it from there.
//!
//! # Example
//!
//! ```
//! use drumbus::dsp::Noise;
//! use drumbus::voices::{synthesize, Instrument};
//!
//! let settings = Instrument::Snare.spec().defaults;
//! let mut noise = Noise::seeded(1);
//! let buffer = synthesize(Instrument::Snare, &settings, 44_100.0, &mut noise);
//! assert_eq!(buffer.len(), settings.envelope().sample_count(44_100.0));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::dsp::{Noise, SVFilter};
use crate::error::EngineError;
use crate::sequencing::InstrumentSettings;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod clap;
mod cowbell;
mod kick;
mod openhat;
mod rimshot;
mod snare;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instrument {
    Kick,
    Snare,
    OpenHat,
    Clap,
    Cowbell,
    Rimshot,
}

impl Instrument {
    /// Grid order, top to bottom.
    pub const ALL: [Instrument; 6] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::OpenHat,
        Instrument::Clap,
        Instrument::Cowbell,
        Instrument::Rimshot,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static InstrumentSpec {
        &REGISTRY[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.name() == wanted)
            .ok_or_else(|| EngineError::UnknownInstrument(s.to_string()))
    }
}

/// What a signal function sees besides time.
pub struct VoiceCtx<'a> {
    pub noise: &'a mut Noise,
    pub settings: &'a InstrumentSettings,
}

impl VoiceCtx<'_> {
    #[inline]
    pub fn noise(&mut self) -> f32 {
        self.noise.sample()
    }
}

/// Signal before the envelope, at `t` seconds after onset.
pub type PartialsFn = fn(t: f32, ctx: &mut VoiceCtx) -> f32;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToneShape {
    LowPass,
    HighPass,
    /// Bell whose gain follows the tone knob: (tone - 0.5) * 12 dB
    Peaking,
}

/// Per-instrument tone control: filter type plus the base frequency the
/// tone knob scales.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneFilter {
    pub shape: ToneShape,
    pub base_hz: f32,
}

impl ToneFilter {
    pub const Q: f32 = 1.0;

    /// tone 0.0 → half the base, 0.5 → 1.25x, 1.0 → 2x.
    pub fn cutoff(&self, tone: f32) -> f32 {
        self.base_hz * (0.5 + tone * 1.5)
    }

    pub fn gain_db(&self, tone: f32) -> f32 {
        match self.shape {
            ToneShape::Peaking => (tone - 0.5) * 12.0,
            _ => 0.0,
        }
    }

    pub fn build(&self, tone: f32, sample_rate: f32) -> SVFilter {
        use crate::dsp::FilterType;

        let filter_type = match self.shape {
            ToneShape::LowPass => FilterType::LowPass,
            ToneShape::HighPass => FilterType::HighPass,
            ToneShape::Peaking => FilterType::Peaking {
                gain_db: self.gain_db(tone),
            },
        };
        SVFilter::new(filter_type, self.cutoff(tone), Self::Q, sample_rate)
    }
}

/// Everything the engine needs to know about one instrument.
pub struct InstrumentSpec {
    pub name: &'static str,
    pub partials: PartialsFn,
    /// `k` in the release tail `exp(-x * k / release)`
    pub release_rate: f32,
    pub output_gain: f32,
    pub tone_filter: ToneFilter,
    pub defaults: InstrumentSettings,
}

impl fmt::Debug for InstrumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentSpec")
            .field("name", &self.name)
            .field("release_rate", &self.release_rate)
            .field("output_gain", &self.output_gain)
            .field("tone_filter", &self.tone_filter)
            .field("defaults", &self.defaults)
            .finish()
    }
}

static REGISTRY: [InstrumentSpec; Instrument::COUNT] = [
    kick::SPEC,
    snare::SPEC,
    openhat::SPEC,
    clap::SPEC,
    cowbell::SPEC,
    rimshot::SPEC,
];

/// Render one hit of `instrument`.
///
/// `partials(t) × envelope(t) × output_gain` for every sample; the length
/// is `round(sample_rate × (attack + decay + release))`. Not clipped.
pub fn synthesize(
    instrument: Instrument,
    settings: &InstrumentSettings,
    sample_rate: f32,
    noise: &mut Noise,
) -> Vec<f32> {
    let spec = instrument.spec();
    let envelope = settings.envelope();
    let len = envelope.sample_count(sample_rate);

    let mut ctx = VoiceCtx { noise, settings };
    let mut buffer = Vec::with_capacity(len);
    for i in 0..len {
        let t = i as f32 / sample_rate;
        let signal = (spec.partials)(t, &mut ctx);
        buffer.push(signal * envelope.amplitude(t, spec.release_rate) * spec.output_gain);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_matches_enum() {
        for instrument in Instrument::ALL {
            assert_eq!(instrument.spec().name, instrument.to_string());
            assert_eq!(Instrument::ALL[instrument.index()], instrument);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("kick".parse::<Instrument>(), Ok(Instrument::Kick));
        assert_eq!("OpenHat".parse::<Instrument>(), Ok(Instrument::OpenHat));
        assert_eq!(" rimshot ".parse::<Instrument>(), Ok(Instrument::Rimshot));
        assert_eq!(
            "tom".parse::<Instrument>(),
            Err(EngineError::UnknownInstrument("tom".into()))
        );
    }

    #[test]
    fn test_buffer_length_for_every_instrument() {
        let mut noise = Noise::seeded(5);
        for sample_rate in [8_000.0, 44_100.0, 48_000.0] {
            for instrument in Instrument::ALL {
                let settings = instrument.spec().defaults;
                let duration =
                    settings.attack as f64 + settings.decay as f64 + settings.release as f64;
                let expected = (sample_rate as f64 * duration).round() as usize;
                let buffer = synthesize(instrument, &settings, sample_rate, &mut noise);
                assert_eq!(buffer.len(), expected, "{} @ {}", instrument, sample_rate);
            }
        }
    }

    #[test]
    fn test_zero_length_settings_render_empty() {
        let mut noise = Noise::seeded(5);
        let settings = InstrumentSettings {
            attack: 0.0,
            decay: 0.0,
            release: 0.0,
            ..Instrument::Clap.spec().defaults
        };
        let buffer = synthesize(Instrument::Clap, &settings, 44_100.0, &mut noise);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_every_voice_is_finite_and_audible() {
        let mut noise = Noise::seeded(11);
        for instrument in Instrument::ALL {
            let settings = instrument.spec().defaults;
            let buffer = synthesize(instrument, &settings, 44_100.0, &mut noise);
            assert!(buffer.iter().all(|s| s.is_finite()));
            let peak = buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
            assert!(peak > 0.05, "{} peak {}", instrument, peak);
        }
    }

    #[test]
    fn test_seeded_render_is_reproducible() {
        let settings = Instrument::Snare.spec().defaults;
        let a = synthesize(Instrument::Snare, &settings, 8_000.0, &mut Noise::seeded(9));
        let b = synthesize(Instrument::Snare, &settings, 8_000.0, &mut Noise::seeded(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_tone_filter_cutoff_scaling() {
        let filter = Instrument::Kick.spec().tone_filter;
        assert_eq!(filter.shape, ToneShape::LowPass);
        assert!((filter.cutoff(0.0) - 40.0).abs() < 1e-4);
        assert!((filter.cutoff(0.5) - 100.0).abs() < 1e-4);
        assert!((filter.cutoff(1.0) - 160.0).abs() < 1e-4);

        let bell = Instrument::Snare.spec().tone_filter;
        assert_eq!(bell.gain_db(0.5), 0.0);
        assert_eq!(bell.gain_db(1.0), 6.0);
        assert_eq!(bell.gain_db(0.0), -6.0);
        assert_eq!(Instrument::OpenHat.spec().tone_filter.shape, ToneShape::HighPass);
    }
}
