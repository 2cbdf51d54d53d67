//! Real-world scenario benchmarks.
//!
//! Voice synthesis is what the control side pays per hit; the bus is what
//! the audio callback pays per block.

mod bus;
mod voices;

pub use bus::bench_bus;
pub use voices::bench_voices;
