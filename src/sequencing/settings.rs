use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::dsp::Adsr;
use crate::error::EngineError;
use crate::voices::Instrument;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Every value that enters through `set` is clamped to its legal range before
it can reach the DSP:

  | field   | range        | NaN   |
  | ------- | ------------ | ----- |
  | attack  | 0.0 ..= 10.0 | 0.0   |
  | decay   | 0.0 ..= 10.0 | 0.0   |
  | release | 0.0 ..= 10.0 | 0.0   |
  | sustain | 0.0 ..= 1.0  | 0.0   |
  | tone    | 0.0 ..= 1.0  | 0.0   |
  | volume  | 0.0 ..= 4.0  | 0.0   |
  | muted   | value != 0   | false |

Volume may go past 1.0; the voices are not clipped and the bus has headroom.
*/

pub const MAX_STAGE_SECONDS: f32 = 10.0;
pub const MAX_VOLUME: f32 = 4.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentSettings {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub volume: f32,
    pub tone: f32,
    pub muted: bool,
}

impl InstrumentSettings {
    /// Neutral tone, not muted.
    pub const fn new(attack: f32, decay: f32, sustain: f32, release: f32, volume: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
            volume,
            tone: 0.5,
            muted: false,
        }
    }

    pub fn envelope(&self) -> Adsr {
        Adsr::new(self.attack, self.decay, self.sustain, self.release)
    }

    pub fn get(&self, field: SettingField) -> f32 {
        match field {
            SettingField::Attack => self.attack,
            SettingField::Decay => self.decay,
            SettingField::Sustain => self.sustain,
            SettingField::Release => self.release,
            SettingField::Volume => self.volume,
            SettingField::Tone => self.tone,
            SettingField::Muted => {
                if self.muted {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Set `field` to `value` clamped into its legal range.
    pub fn set(&mut self, field: SettingField, value: f32) {
        match field {
            SettingField::Attack => self.attack = clamp(value, 0.0, MAX_STAGE_SECONDS),
            SettingField::Decay => self.decay = clamp(value, 0.0, MAX_STAGE_SECONDS),
            SettingField::Release => self.release = clamp(value, 0.0, MAX_STAGE_SECONDS),
            SettingField::Sustain => self.sustain = clamp(value, 0.0, 1.0),
            SettingField::Tone => self.tone = clamp(value, 0.0, 1.0),
            SettingField::Volume => self.volume = clamp(value, 0.0, MAX_VOLUME),
            SettingField::Muted => self.muted = !value.is_nan() && value != 0.0,
        }
    }
}

/// NaN maps to the lower bound.
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
pub enum SettingField {
    Attack,
    Decay,
    Sustain,
    Release,
    Volume,
    Tone,
    Muted,
}

impl SettingField {
    pub const ALL: [SettingField; 7] = [
        SettingField::Attack,
        SettingField::Decay,
        SettingField::Sustain,
        SettingField::Release,
        SettingField::Volume,
        SettingField::Tone,
        SettingField::Muted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SettingField::Attack => "attack",
            SettingField::Decay => "decay",
            SettingField::Sustain => "sustain",
            SettingField::Release => "release",
            SettingField::Volume => "volume",
            SettingField::Tone => "tone",
            SettingField::Muted => "muted",
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingField {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SettingField::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| EngineError::UnknownParam(s.to_string()))
    }
}

/// One settings record per instrument, indexed by `Instrument`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsTable {
    settings: [InstrumentSettings; Instrument::COUNT],
}

impl SettingsTable {
    pub fn iter(&self) -> impl Iterator<Item = (Instrument, &InstrumentSettings)> {
        Instrument::ALL.into_iter().zip(self.settings.iter())
    }
}

impl Default for SettingsTable {
    fn default() -> Self {
        Self {
            settings: Instrument::ALL.map(|instrument| instrument.spec().defaults),
        }
    }
}

impl Index<Instrument> for SettingsTable {
    type Output = InstrumentSettings;

    fn index(&self, instrument: Instrument) -> &Self::Output {
        &self.settings[instrument.index()]
    }
}

impl IndexMut<Instrument> for SettingsTable {
    fn index_mut(&mut self, instrument: Instrument) -> &mut Self::Output {
        &mut self.settings[instrument.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_registry() {
        let table = SettingsTable::default();
        let kick = table[Instrument::Kick];
        assert_eq!(kick.attack, 0.001);
        assert_eq!(kick.decay, 0.3);
        assert_eq!(kick.sustain, 0.2);
        assert_eq!(kick.release, 0.8);
        assert_eq!(kick.volume, 0.9);
        assert_eq!(kick.tone, 0.5);
        assert!(!kick.muted);

        let rimshot = table[Instrument::Rimshot];
        assert_eq!(rimshot.release, 0.15);
        assert_eq!(rimshot.volume, 0.8);
    }

    #[test]
    fn test_nan_and_negative_clamp_to_lower_bound() {
        let mut settings = Instrument::Snare.spec().defaults;
        settings.set(SettingField::Attack, f32::NAN);
        settings.set(SettingField::Release, -3.0);
        settings.set(SettingField::Sustain, f32::NAN);
        assert_eq!(settings.attack, 0.0);
        assert_eq!(settings.release, 0.0);
        assert_eq!(settings.sustain, 0.0);
    }

    #[test]
    fn test_upper_bounds() {
        let mut settings = Instrument::Snare.spec().defaults;
        settings.set(SettingField::Tone, 7.0);
        settings.set(SettingField::Volume, 1.5);
        assert_eq!(settings.tone, 1.0);
        // Volume past unity is allowed
        assert_eq!(settings.volume, 1.5);

        settings.set(SettingField::Volume, f32::INFINITY);
        assert_eq!(settings.volume, MAX_VOLUME);
    }

    #[test]
    fn test_muted_from_number() {
        let mut settings = Instrument::Clap.spec().defaults;
        settings.set(SettingField::Muted, 1.0);
        assert!(settings.muted);
        assert_eq!(settings.get(SettingField::Muted), 1.0);
        settings.set(SettingField::Muted, 0.0);
        assert!(!settings.muted);
        settings.set(SettingField::Muted, f32::NAN);
        assert!(!settings.muted);
    }

    #[test]
    fn test_parse_field() {
        assert_eq!("Attack".parse::<SettingField>(), Ok(SettingField::Attack));
        assert_eq!("muted".parse::<SettingField>(), Ok(SettingField::Muted));
        assert!(matches!(
            "pitch".parse::<SettingField>(),
            Err(EngineError::UnknownParam(_))
        ));
    }

    #[test]
    fn test_table_index_mut() {
        let mut table = SettingsTable::default();
        table[Instrument::Cowbell].set(SettingField::Volume, 0.1);
        assert_eq!(table[Instrument::Cowbell].volume, 0.1);
        assert_eq!(table.iter().count(), Instrument::COUNT);
    }
}
