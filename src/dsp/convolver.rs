use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/*
Partitioned Convolution
=======================

Convolving with a two second impulse response sample by sample costs
88 200 multiply-adds per output sample at 44.1kHz. Doing it in the frequency
domain turns that into a handful of FFTs per block plus one complex multiply
per bin per partition.

Uniformly partitioned overlap-save:

  1. Cut the IR into P partitions of B samples. Zero-pad each to N = 2B and
     FFT it once, up front: H_0 .. H_{P-1}.

  2. Collect B input samples. Slide them into a 2B window (previous block +
     this block) and FFT the window: X_k. Keep the last P input spectra in a
     ring, the frequency-domain delay line.

  3. Multiply-accumulate:

         Y_k = Σ_p  X_{k-p} · H_p

  4. Inverse FFT Y_k. The first B samples are circular wrap-around garbage,
     the last B are the valid output for this block.

  Ring (newest at `pos`):

      [ X_k | X_{k-1} | X_{k-2} | ... ]     each slot N bins
        H_0    H_1       H_2

The cost is one forward FFT per block (shared by both output channels), one
inverse FFT per channel, and P·N complex multiply-adds per channel.

Latency is one partition: a sample pushed now appears B samples later. The
per-sample API hides the blocking; it returns the previous block's output
while the current one fills.
*/

pub const DEFAULT_PARTITION_SIZE: usize = 512;

/// Mono in, stereo out convolver over a fixed two-channel impulse response.
pub struct Convolver {
    block: usize,
    partitions: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// IR spectra per channel, `partitions * 2 * block` bins each
    ir_spectra: [Vec<Complex<f32>>; 2],
    /// Ring of input spectra, same layout as `ir_spectra`
    history: Vec<Complex<f32>>,
    pos: usize,
    /// Sliding 2B input window
    window: Vec<f32>,
    fill: usize,
    output: [Vec<f32>; 2],
    work: Vec<Complex<f32>>,
    acc: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl Convolver {
    pub fn new(left: &[f32], right: &[f32], partition_size: usize) -> Self {
        let block = partition_size.max(1);
        let size = block * 2;
        let longest = left.len().max(right.len());
        let partitions = longest.div_ceil(block).max(1);

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex::new(0.0, 0.0); scratch_len];

        let mut spectra = |ir: &[f32]| {
            let mut bins = vec![Complex::new(0.0, 0.0); partitions * size];
            for (p, chunk) in ir.chunks(block).enumerate() {
                let slot = &mut bins[p * size..(p + 1) * size];
                for (bin, &tap) in slot.iter_mut().zip(chunk) {
                    bin.re = tap;
                }
                forward.process_with_scratch(slot, &mut scratch);
            }
            bins
        };
        let ir_spectra = [spectra(left), spectra(right)];

        Self {
            block,
            partitions,
            forward,
            inverse,
            ir_spectra,
            history: vec![Complex::new(0.0, 0.0); partitions * size],
            pos: 0,
            window: vec![0.0; size],
            fill: 0,
            output: [vec![0.0; block], vec![0.0; block]],
            work: vec![Complex::new(0.0, 0.0); size],
            acc: vec![Complex::new(0.0, 0.0); size],
            scratch,
        }
    }

    /// Samples between input and the corresponding output.
    pub fn latency(&self) -> usize {
        self.block
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> (f32, f32) {
        self.window[self.block + self.fill] = sample;
        let out = (self.output[0][self.fill], self.output[1][self.fill]);

        self.fill += 1;
        if self.fill == self.block {
            self.process_block();
            self.fill = 0;
        }
        out
    }

    fn process_block(&mut self) {
        let size = self.block * 2;

        for (bin, &sample) in self.work.iter_mut().zip(&self.window) {
            *bin = Complex::new(sample, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.work, &mut self.scratch);

        self.pos = (self.pos + 1) % self.partitions;
        self.history[self.pos * size..(self.pos + 1) * size].copy_from_slice(&self.work);

        let norm = 1.0 / size as f32;
        for channel in 0..2 {
            self.acc.fill(Complex::new(0.0, 0.0));
            for p in 0..self.partitions {
                let slot = (self.pos + self.partitions - p) % self.partitions;
                let x = &self.history[slot * size..(slot + 1) * size];
                let h = &self.ir_spectra[channel][p * size..(p + 1) * size];
                for ((acc, &x), &h) in self.acc.iter_mut().zip(x).zip(h) {
                    *acc += x * h;
                }
            }
            self.inverse
                .process_with_scratch(&mut self.acc, &mut self.scratch);

            for (out, bin) in self.output[channel]
                .iter_mut()
                .zip(&self.acc[self.block..])
            {
                *out = bin.re * norm;
            }
        }

        self.window.copy_within(self.block.., 0);
    }

    pub fn reset(&mut self) {
        self.history.fill(Complex::new(0.0, 0.0));
        self.window.fill(0.0);
        for channel in self.output.iter_mut() {
            channel.fill(0.0);
        }
        self.fill = 0;
        self.pos = 0;
    }
}
