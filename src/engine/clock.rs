use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;

/// The timeline the scheduler schedules against.
///
/// `now()` must be the same clock the master bus plays voices on; any other
/// clock drifts and the grid goes out of time.
#[allow(async_fn_in_trait)]
pub trait ClockControl {
    /// Current time in seconds.
    fn now(&self) -> f64;

    /// A suspended clock does not advance.
    fn is_suspended(&self) -> bool;

    /// Get the clock moving again. Must complete before the next read of `now`.
    async fn resume(&mut self) -> Result<()>;
}

#[derive(Debug)]
struct ClockInner {
    frames: AtomicU64,
    sample_rate: f32,
    suspended: AtomicBool,
}

/// Frame counter shared between the master bus (writer) and the engine
/// (reader). The bus advances it by every block it renders, so it is exactly
/// the audio device's notion of time.
#[derive(Debug, Clone)]
pub struct SharedClock {
    inner: Arc<ClockInner>,
}

impl SharedClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            inner: Arc::new(ClockInner {
                frames: AtomicU64::new(0),
                sample_rate,
                suspended: AtomicBool::new(false),
            }),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.inner.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.inner.frames.load(Ordering::Acquire)
    }

    pub fn advance(&self, frames: u64) {
        self.inner.frames.fetch_add(frames, Ordering::AcqRel);
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.inner.suspended.store(suspended, Ordering::Release);
    }

    /// Seconds → frame index on this timeline.
    pub fn frame_at(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.inner.sample_rate as f64).round() as u64
    }
}

impl ClockControl for SharedClock {
    fn now(&self) -> f64 {
        self.frames() as f64 / self.inner.sample_rate as f64
    }

    fn is_suspended(&self) -> bool {
        self.inner.suspended.load(Ordering::Acquire)
    }

    async fn resume(&mut self) -> Result<()> {
        self.set_suspended(false);
        Ok(())
    }
}
