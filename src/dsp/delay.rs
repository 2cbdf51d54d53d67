/// Circular buffer delay line.
///
/// Sized once from the longest delay it must hold; reads and writes never
/// allocate. Callers that feed the output back in read first, then write.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// A line able to hold `max_seconds` of audio at `sample_rate`.
    pub fn new(max_seconds: f32, sample_rate: f32) -> Self {
        let capacity = (max_seconds.max(0.0) * sample_rate).ceil() as usize + 1;
        Self::with_capacity(capacity)
    }

    pub fn with_capacity(samples: usize) -> Self {
        Self {
            buffer: vec![0.0; samples.max(2)],
            write_pos: 0,
        }
    }

    /// Longest delay in samples this line can produce.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Sample written `delay_samples` writes ago. Clamped to 1..=max_delay.
    #[inline]
    pub fn read(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1, len - 1);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Write `sample` and return the one from `delay_samples` ago.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, delay_samples: usize) -> f32 {
        let delayed = self.read(delay_samples);
        self.write(sample);
        delayed
    }

    pub fn render(&mut self, buffer: &mut [f32], delay_samples: usize) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay_samples);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
