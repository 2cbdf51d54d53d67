pub mod config; // Engine configuration and builders
pub mod dsp; // Signal primitives
pub mod effects; // Master bus effects
pub mod engine; // Transport, routing and the tick loop
pub mod error;
pub mod sequencing; // Patterns, settings and lookahead scheduling
pub mod voices; // Synthesized drum voices

pub use config::EngineConfig;
pub use engine::{ClockControl, Engine, EngineHandle, MasterBus, SharedClock, TickOutcome, VoiceRouter};
pub use error::{EngineError, Result};
pub use sequencing::{Session, SettingField};
pub use voices::Instrument;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
