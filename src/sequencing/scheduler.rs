//! Lookahead step scheduler.
//!
//! The scheduler never touches audio. It is called from a coarse, jittery
//! timer and turns "what time is it now" into "which steps start in the
//! next few milliseconds, and at exactly which clock time".

use crate::sequencing::{InstrumentSettings, Session};
use crate::voices::Instrument;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Lookahead Scheduling
====================

A UI-thread timer firing every ~25ms is far too imprecise to start drums
on: a sixteenth at 120 BPM is 125ms and the ear hears 5ms of slop. The
audio clock, on the other hand, is sample-accurate but can't run our code.

So we split the job:

  timer (coarse)     wakes every tick_interval, looks `lookahead` seconds
                     ahead, and schedules every step that starts inside
                     that window
  audio clock        plays each voice at its absolute start time

      now                    now + lookahead
       │◄───────── window ──────────►│
  ─────┼──────┬──────────────┬───────┼──────┬───────→ clock time
              step n         step n+1       step n+2 (next tick)

Each step gets an ABSOLUTE start time (`next_step_time`), never "now", so
however late the timer fires the hits land on the grid. As long as the
window is wider than the worst timer jitter, nothing is missed; the window
overlaps between ticks but a step is only scheduled once because
`next_step_time` has already moved past it.


Tempo Changes
-------------

The step duration is recomputed on every tick from the current BPM, and only
future steps use it. Voices already handed to the router keep their start
times; nothing is retimed.


Falling Behind
--------------

If the clock jumps far ahead of `next_step_time` (a suspended device that
resumed, a stalled thread) the loop would fire every missed step at once. Past
`max_lateness` we drop the backlog and re-anchor to now instead.


Step Index
----------

The step index is a counter that wraps at the pattern length, not
`floor(time / step_duration)`. The two agree at a fixed tempo started from
zero; the counter also stays on the grid across tempo changes and after a
start at an arbitrary clock time, and is immune to floating-point floor
errors at exact step boundaries.
*/

pub const MIN_BPM: f32 = 20.0;
pub const MAX_BPM: f32 = 300.0;

/// Sixteenth notes per beat.
const STEPS_PER_BEAT: f64 = 4.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Receives the scheduler's decisions.
pub trait StepSink {
    /// Start `instrument` at absolute clock time `when`.
    fn trigger(&mut self, instrument: Instrument, settings: &InstrumentSettings, when: f64);

    /// Step `index` begins at `when`. Called after its triggers.
    fn step(&mut self, _index: usize, _when: f64) {}
}

/// A scheduled hit, as recorded by the `Vec<Trigger>` sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub instrument: Instrument,
    pub when: f64,
}

impl StepSink for Vec<Trigger> {
    fn trigger(&mut self, instrument: Instrument, _settings: &InstrumentSettings, when: f64) {
        self.push(Trigger { instrument, when });
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    state: TransportState,
    /// Tempo in beats per minute
    bpm: f32,
    /// Absolute clock time of the next unscheduled step
    next_step_time: f64,
    /// Step counter, always below the pattern length
    step: usize,
    /// Most recently scheduled step, for display
    current: Option<usize>,
    /// Seconds ahead of the clock to schedule
    lookahead: f64,
    /// Backlog beyond which the transport re-anchors to now
    max_lateness: f64,
}

impl Scheduler {
    pub fn new(bpm: f32, lookahead: f64, max_lateness: f64) -> Self {
        Self {
            state: TransportState::Stopped,
            bpm: clamp_bpm(bpm).unwrap_or(120.0),
            next_step_time: 0.0,
            step: 0,
            current: None,
            lookahead,
            max_lateness,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn next_step_time(&self) -> f64 {
        self.next_step_time
    }

    /// The step that will be scheduled next.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Last scheduled step while running, `None` when stopped.
    pub fn current_step(&self) -> Option<usize> {
        self.current
    }

    /// Seconds per sixteenth at the current tempo.
    pub fn step_duration(&self) -> f64 {
        60.0 / self.bpm as f64 / STEPS_PER_BEAT
    }

    pub fn start(&mut self, now: f64) {
        self.next_step_time = now;
        self.step = 0;
        self.current = None;
        self.state = TransportState::Running;
    }

    /// Stop scheduling. Voices already handed out keep playing.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.step = 0;
        self.current = None;
    }

    /// Clamped to 20..=300. NaN is ignored.
    pub fn set_tempo(&mut self, bpm: f32) {
        if let Some(bpm) = clamp_bpm(bpm) {
            self.bpm = bpm;
        }
    }

    /// Schedule every step that starts before `now + lookahead`.
    ///
    /// Returns how many steps were scheduled. Does nothing while stopped.
    pub fn tick(&mut self, now: f64, session: &Session, sink: &mut impl StepSink) -> usize {
        if self.state != TransportState::Running {
            return 0;
        }

        let step_duration = self.step_duration();
        if now - self.next_step_time > self.max_lateness {
            tracing::warn!(
                behind = now - self.next_step_time,
                "transport fell behind, re-anchoring"
            );
            self.next_step_time = now;
        }

        let length = session.patterns.len().max(1);
        let pattern = session.patterns.active(session.fill_mode);
        let horizon = now + self.lookahead;
        let mut scheduled = 0;

        while self.next_step_time < horizon {
            let index = self.step % length;
            let when = self.next_step_time;

            for instrument in pattern.active_at(index) {
                let settings = &session.settings[instrument];
                if !settings.muted {
                    sink.trigger(instrument, settings, when);
                }
            }
            sink.step(index, when);

            self.current = Some(index);
            self.next_step_time += step_duration;
            self.step = (index + 1) % length;
            scheduled += 1;
        }

        scheduled
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(120.0, 0.1, 0.25)
    }
}

fn clamp_bpm(bpm: f32) -> Option<f32> {
    if bpm.is_nan() {
        None
    } else {
        Some(bpm.clamp(MIN_BPM, MAX_BPM))
    }
}
