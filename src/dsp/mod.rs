//! Low-level DSP primitives the voices and effects are built from.
//!
//! These components stay focused on the signal-processing math. Buffers are
//! sized at construction; `process`/`render` never allocate, so everything
//! here is safe to run on the audio thread.

/// Uniformly partitioned FFT convolution.
pub mod convolver;
/// Circular-buffer delay line.
pub mod delay;
/// Attack/decay/sustain/release amplitude curve.
pub mod envelope;
/// State-variable filter with low/high/peaking/all-pass responses.
pub mod filter;
/// Dry/wet crossfade laws.
pub mod mix;
/// Seedable white noise.
pub mod noise;

pub use envelope::Adsr;
pub use filter::{FilterType, SVFilter};
pub use mix::Crossfade;
pub use noise::Noise;
