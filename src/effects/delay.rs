use crate::dsp::{delay::DelayLine, Crossfade};

/*
Feedback Delay
==============

          ┌──────────────── dry (1 - mix) ───────────────┐
          │                                              ▼
  in ─────┼──→ (+) ──→ [ delay line ] ──┬── wet (mix) ──→ (+) ──→ out
               ▲                        │
               └──── feedback ◄─────────┘

Each echo is the previous one times `feedback`. Below 1.0 the echoes die
away geometrically; at 1.0 they never die and anything above grows without
bound. The DSP clamps to MAX_FEEDBACK no matter what it is handed, so even a
misbehaving caller can't blow up the bus.
*/

pub const MAX_FEEDBACK: f32 = 0.95;
pub const MIN_DELAY_SECONDS: f32 = 0.0625;

#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    line: DelayLine,
    sample_rate: f32,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
}

impl FeedbackDelay {
    pub fn new(max_seconds: f32, sample_rate: f32) -> Self {
        let mut delay = Self {
            line: DelayLine::new(max_seconds.max(MIN_DELAY_SECONDS), sample_rate),
            sample_rate,
            delay_samples: 1,
            feedback: 0.0,
            mix: 0.0,
        };
        delay.set_time(0.25);
        delay
    }

    /// Delay time in seconds, limited to what the line can hold.
    pub fn set_time(&mut self, seconds: f32) {
        let samples = (seconds.max(0.0) * self.sample_rate).round() as usize;
        self.delay_samples = samples.clamp(1, self.line.max_delay());
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = if feedback.is_nan() {
            0.0
        } else {
            feedback.clamp(0.0, MAX_FEEDBACK)
        };
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read(self.delay_samples);
        self.line.write(input + delayed * self.feedback);
        Crossfade::Linear.blend(input, delayed, self.mix)
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}
