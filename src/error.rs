/// Errors surfaced by the engine's control API.
///
/// Nothing on the render path returns these: synthesis and mixing never fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Delay feedback {0} would grow without bound (must be below 1.0)")]
    UnstableFeedback(f32),

    #[error("Step {index} is outside a {length}-step pattern")]
    StepOutOfRange { index: usize, length: usize },

    #[error("Pattern length must be 16 or 32, got {0}")]
    InvalidPatternLength(usize),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Unknown parameter: {0}")]
    UnknownParam(String),

    #[error("Failed to resume audio clock: {0}")]
    ClockResume(String),

    #[error("Voice queue is full")]
    BusFull,
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
