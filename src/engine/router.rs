use rtrb::{Consumer, Producer, RingBuffer};

use crate::{
    config::EngineConfig,
    dsp::{Noise, SVFilter},
    effects::{EffectParams, EffectsChain},
    engine::clock::{ClockControl, SharedClock},
    error::{EngineError, Result},
    sequencing::InstrumentSettings,
    voices::{self, Instrument},
    MAX_BLOCK_SIZE,
};

/*
Voice Routing
=============

Two halves joined by a lock-free SPSC queue:

  control side                              render side (audio callback)
  ────────────                              ────────────────────────────
  VoiceRouter::route()                      MasterBus::render()
    synthesize the hit                        drain the queue
    attach gain + tone filter                 mix every voice at its frame
    push ──────────── rtrb ──────────────→    effects chain → left / right
                                              advance the shared clock

All synthesis happens on the control side, so the audio callback only adds
finished buffers together. Each voice carries an absolute start frame on the
shared clock. A voice that arrives after its frame has passed starts at the
beginning of the next block instead of being dropped:

  block:     |··········|··········|··········|
  voice A:        ▲ start_frame = 4  (on time, sample-accurate)
  voice B:   (start_frame already passed) → starts at the block start

A voice is a one-shot. Once its buffer has been read to the end it leaves the
bus; there is no pooling or stealing. The render side never frees memory:
spent voices go back over a second queue and the router drops them.

  MasterBus ──── retired voices (rtrb) ────→ VoiceRouter::reclaim()

At most `queue_capacity` voices play at once. While the bus is full, new
messages wait in the queue until a voice finishes.
*/

pub enum BusMessage {
    Play(Voice),
    Effects(EffectParams),
}

/// A rendered hit waiting to be mixed.
pub struct Voice {
    samples: Vec<f32>,
    start_frame: u64,
    gain: f32,
    filter: SVFilter,
    pos: usize,
}

impl Voice {
    pub fn new(samples: Vec<f32>, start_frame: u64, gain: f32, filter: SVFilter) -> Self {
        Self {
            samples,
            start_frame,
            gain,
            filter,
            pos: 0,
        }
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.pos >= self.samples.len()
    }

    /// Add this voice into `out`, whose first frame is `block_start`.
    fn mix_into(&mut self, out: &mut [f32], block_start: u64) {
        let offset = self.start_frame.saturating_sub(block_start);
        if offset >= out.len() as u64 {
            return;
        }

        for o in out[offset as usize..].iter_mut() {
            let Some(&sample) = self.samples.get(self.pos) else {
                break;
            };
            *o += self.filter.process(sample) * self.gain;
            self.pos += 1;
        }
    }
}

/// Build the control-side router and the render-side bus for one session.
pub fn channel(config: &EngineConfig, clock: SharedClock) -> (VoiceRouter, MasterBus) {
    let (tx, rx) = RingBuffer::<BusMessage>::new(config.queue_capacity);
    // Room for every voice in flight plus every voice still queued
    let (retired_tx, retired_rx) = RingBuffer::<Voice>::new(config.queue_capacity * 2);

    // Separate streams so the reverb doesn't shift with every hit
    let mut reverb_noise = Noise::from_seed(config.seed);
    let voice_noise = Noise::from_seed(config.seed.map(|seed| seed.wrapping_add(1)));

    let router = VoiceRouter {
        tx,
        retired: retired_rx,
        noise: voice_noise,
        sample_rate: config.sample_rate,
        clock: clock.clone(),
    };
    let bus = MasterBus {
        rx,
        retired: retired_tx,
        voices: Vec::with_capacity(config.queue_capacity),
        max_voices: config.queue_capacity,
        mix_buffer: vec![0.0; MAX_BLOCK_SIZE],
        scratch_left: vec![0.0; MAX_BLOCK_SIZE],
        scratch_right: vec![0.0; MAX_BLOCK_SIZE],
        chain: EffectsChain::new(config, &mut reverb_noise),
        clock,
    };
    (router, bus)
}

/// Control-side front of the bus.
pub struct VoiceRouter {
    tx: Producer<BusMessage>,
    retired: Consumer<Voice>,
    noise: Noise,
    sample_rate: f32,
    clock: SharedClock,
}

impl VoiceRouter {
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Synthesize `instrument` and queue it to start at clock time `when`.
    pub fn route(
        &mut self,
        instrument: Instrument,
        settings: &InstrumentSettings,
        when: f64,
    ) -> Result<()> {
        self.reclaim();
        let samples = voices::synthesize(instrument, settings, self.sample_rate, &mut self.noise);
        let filter = instrument
            .spec()
            .tone_filter
            .build(settings.tone, self.sample_rate);
        let voice = Voice::new(samples, self.clock.frame_at(when), settings.volume, filter);

        self.tx.push(BusMessage::Play(voice)).map_err(|_| {
            tracing::warn!(%instrument, when, "voice queue full, dropping hit");
            EngineError::BusFull
        })
    }

    pub fn update_effects(&mut self, params: &EffectParams) -> Result<()> {
        self.tx.push(BusMessage::Effects(*params)).map_err(|_| {
            tracing::warn!("voice queue full, dropping effect update");
            EngineError::BusFull
        })
    }

    /// Drop the voices the bus has finished with. Returns how many.
    pub fn reclaim(&mut self) -> usize {
        let mut count = 0;
        while self.retired.pop().is_ok() {
            count += 1;
        }
        count
    }

    /// Free slots in the queue.
    pub fn slots(&self) -> usize {
        self.tx.slots()
    }
}

/// Render side: owns the voices in flight and the effects chain.
pub struct MasterBus {
    rx: Consumer<BusMessage>,
    retired: Producer<Voice>,
    voices: Vec<Voice>,
    max_voices: usize,
    mix_buffer: Vec<f32>,
    scratch_left: Vec<f32>,
    scratch_right: Vec<f32>,
    chain: EffectsChain,
    clock: SharedClock,
}

impl MasterBus {
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn effects(&self) -> &EffectsChain {
        &self.chain
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    fn drain(&mut self) {
        while self.voices.len() < self.max_voices {
            let Ok(msg) = self.rx.pop() else {
                break;
            };
            match msg {
                BusMessage::Play(voice) => {
                    if !voice.is_empty() {
                        self.voices.push(voice);
                    }
                }
                BusMessage::Effects(params) => self.chain.set_params(&params),
            }
        }
    }

    fn retire_finished(&mut self) {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].is_finished() {
                let voice = self.voices.swap_remove(i);
                // Only drops here if the router has stopped reclaiming
                let _ = self.retired.push(voice);
            } else {
                i += 1;
            }
        }
    }

    /// Render one stereo block and advance the clock by its length.
    ///
    /// While the clock is suspended the output is silence and time stands
    /// still.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        if self.clock.is_suspended() {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        self.drain();

        let mut offset = 0;
        while offset < frames {
            let len = (frames - offset).min(MAX_BLOCK_SIZE);
            let block_start = self.clock.frames();

            let mix = &mut self.mix_buffer[..len];
            mix.fill(0.0);
            for voice in self.voices.iter_mut() {
                voice.mix_into(mix, block_start);
            }
            self.retire_finished();

            self.chain.render(
                &mut self.mix_buffer[..len],
                &mut left[offset..offset + len],
                &mut right[offset..offset + len],
            );
            self.clock.advance(len as u64);
            offset += len;
        }
    }

    /// Render into an interleaved device buffer. Mono devices get the
    /// average of both sides; channels past the second are silent.
    pub fn render_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        let mut left = std::mem::take(&mut self.scratch_left);
        let mut right = std::mem::take(&mut self.scratch_right);

        for chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let frames = chunk.len() / channels;
            self.render(&mut left[..frames], &mut right[..frames]);

            for (i, frame) in chunk.chunks_exact_mut(channels).enumerate() {
                match frame {
                    [mono] => *mono = (left[i] + right[i]) * 0.5,
                    [l, r, rest @ ..] => {
                        *l = left[i];
                        *r = right[i];
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
        }

        self.scratch_left = left;
        self.scratch_right = right;
    }
}
