//! Patterns, per-instrument settings and the step scheduler.
//!
//! The scheduler reads a [`Session`] snapshot on every tick and never holds
//! on to it, so a caller that swaps in a new snapshot between ticks gets
//! its change picked up on the next step with no partial updates visible.

pub mod pattern;
pub mod scheduler;
pub mod settings;

pub use pattern::{Pattern, PatternBank};
pub use scheduler::{Scheduler, StepSink, TransportState, Trigger};
pub use settings::{InstrumentSettings, SettingField, SettingsTable};

use crate::effects::EffectParams;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything the scheduler and router read, published as one value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub patterns: PatternBank,
    pub settings: SettingsTable,
    pub effects: EffectParams,
    pub fill_mode: bool,
    pub bpm: f32,
}

impl Session {
    pub fn new(pattern_length: usize, bpm: f32) -> crate::Result<Self> {
        Ok(Self {
            patterns: PatternBank::new(pattern_length)?,
            bpm,
            ..Self::default()
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            patterns: PatternBank::default(),
            settings: SettingsTable::default(),
            effects: EffectParams::default(),
            fill_mode: false,
            bpm: 120.0,
        }
    }
}
