/*
Step Patterns
=============

A pattern is a grid: one row per instrument, one column per step. A step is
a sixteenth note, so 16 steps is one bar of 4/4 and 32 steps is two.

        0   1   2   3   4   5   6   7   8   9  10  11  12  13  14  15
  kick  ■   ·   ·   ·   ■   ·   ·   ·   ■   ·   ·   ·   ■   ·   ·   ·
  snare ·   ·   ·   ·   ■   ·   ·   ·   ·   ·   ·   ·   ■   ·   ·   ·
  ...

Column 0 is the downbeat. Playback walks the columns left to right and
wraps.

The bank keeps two grids of the same length: the main groove and a fill.
Switching between them never moves the playhead, so a fill can be dropped
in mid-bar and the groove picks up on the very next step.
*/

use crate::error::{EngineError, Result};
use crate::voices::Instrument;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const SUPPORTED_LENGTHS: [usize; 2] = [16, 32];

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    length: usize,
    rows: [Vec<bool>; Instrument::COUNT],
}

impl Pattern {
    /// An empty pattern. Lengths other than 16 or 32 are rejected.
    pub fn new(length: usize) -> Result<Self> {
        check_length(length)?;
        Ok(Self::blank(length))
    }

    fn blank(length: usize) -> Self {
        Self {
            length,
            rows: std::array::from_fn(|_| vec![false; length]),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    /// No step set on any row.
    pub fn is_blank(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|&step| !step))
    }

    /// Whether `instrument` plays on `index`. Out-of-range reads are false.
    pub fn is_active(&self, instrument: Instrument, index: usize) -> bool {
        self.rows[instrument.index()]
            .get(index)
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, instrument: Instrument, index: usize, active: bool) -> Result<()> {
        let length = self.length;
        let step = self.rows[instrument.index()]
            .get_mut(index)
            .ok_or(EngineError::StepOutOfRange { index, length })?;
        *step = active;
        Ok(())
    }

    /// Flip a step and return its new state.
    pub fn toggle(&mut self, instrument: Instrument, index: usize) -> Result<bool> {
        let active = !self.is_active(instrument, index);
        self.set(instrument, index, active)?;
        Ok(active)
    }

    pub fn row(&self, instrument: Instrument) -> &[bool] {
        &self.rows[instrument.index()]
    }

    /// Instruments with a hit on `index`, in grid order.
    pub fn active_at(&self, index: usize) -> impl Iterator<Item = Instrument> + '_ {
        Instrument::ALL
            .into_iter()
            .filter(move |&instrument| self.is_active(instrument, index))
    }

    /// Grow or shrink to `length`. Surviving steps keep their state, new ones start off.
    pub fn resize(&mut self, length: usize) -> Result<()> {
        check_length(length)?;
        for row in self.rows.iter_mut() {
            row.resize(length, false);
        }
        self.length = length;
        Ok(())
    }

    pub fn clear(&mut self) {
        for row in self.rows.iter_mut() {
            row.fill(false);
        }
    }
}

pub(crate) fn check_length(length: usize) -> Result<()> {
    if SUPPORTED_LENGTHS.contains(&length) {
        Ok(())
    } else {
        Err(EngineError::InvalidPatternLength(length))
    }
}

/// Main groove plus fill, always the same length.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBank {
    pub main: Pattern,
    pub fill: Pattern,
}

impl PatternBank {
    pub fn new(length: usize) -> Result<Self> {
        Ok(Self {
            main: Pattern::new(length)?,
            fill: Pattern::new(length)?,
        })
    }

    pub fn len(&self) -> usize {
        self.main.len()
    }

    /// The pattern playback reads from.
    pub fn active(&self, fill_mode: bool) -> &Pattern {
        if fill_mode {
            &self.fill
        } else {
            &self.main
        }
    }

    pub fn pattern_mut(&mut self, fill: bool) -> &mut Pattern {
        if fill {
            &mut self.fill
        } else {
            &mut self.main
        }
    }

    pub fn set_length(&mut self, length: usize) -> Result<()> {
        check_length(length)?;
        self.main.resize(length)?;
        self.fill.resize(length)
    }
}

impl Default for PatternBank {
    fn default() -> Self {
        Self {
            main: Pattern::blank(16),
            fill: Pattern::blank(16),
        }
    }
}
