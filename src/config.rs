use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Session-wide knobs, fixed when the engine is built.
///
/// Defaults match a typical 44.1kHz device and a 16-step pattern at 120 BPM.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// How far ahead of the clock a tick schedules steps, in seconds.
    pub lookahead: f64,
    /// Wall-clock period of the scheduler tick.
    pub tick_interval: Duration,
    /// Beyond this many seconds behind, the transport re-anchors to now.
    pub max_lateness: f64,
    pub pattern_length: usize,
    pub bpm: f32,
    /// Messages the router can queue before the master bus drains them.
    pub queue_capacity: usize,
    pub master_gain: f32,
    pub reverb_seconds: f32,
    pub reverb_decay: f32,
    pub max_delay_seconds: f32,
    /// Fixed noise seed for reproducible renders.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            lookahead: 0.1,
            tick_interval: Duration::from_millis(25),
            max_lateness: 0.25,
            pattern_length: 16,
            bpm: 120.0,
            queue_capacity: 256,
            master_gain: 1.0,
            reverb_seconds: 2.0,
            reverb_decay: 3.0,
            max_delay_seconds: 1.0,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate.max(1.0);
        self
    }

    pub fn with_lookahead(mut self, seconds: f64) -> Self {
        self.lookahead = seconds.max(0.0);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_max_lateness(mut self, seconds: f64) -> Self {
        self.max_lateness = seconds.max(0.0);
        self
    }

    pub fn with_pattern_length(mut self, length: usize) -> Self {
        self.pattern_length = length;
        self
    }

    pub fn with_bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain.max(0.0);
        self
    }

    pub fn with_reverb(mut self, seconds: f32, decay: f32) -> Self {
        self.reverb_seconds = seconds.max(0.0);
        self.reverb_decay = decay.max(0.0);
        self
    }

    pub fn with_max_delay(mut self, seconds: f32) -> Self {
        self.max_delay_seconds = seconds.max(0.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
