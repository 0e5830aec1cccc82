//! Simulated frame clock.
//!
//! Time only moves when [`ManualFrameSource::advance`] or
//! [`ManualFrameSource::step_frame`] is called, which makes interval behavior
//! fully deterministic in tests and headless drivers.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use tracing::trace;

use crate::config::IntervalConfig;
use crate::error::IntervalResult;
use crate::source::{FrameCallback, FrameId, FrameQueue, FrameSource};

/// Frame latency of a 60Hz-ish display, as a fake timer would model it
pub const DEFAULT_FRAME_LATENCY: Duration = Duration::from_millis(16);

/// Frame source driven by explicit time advancement
#[derive(Debug)]
pub struct ManualFrameSource {
    queue: RefCell<FrameQueue>,
    now: Cell<Duration>,
    next_frame_at: Cell<Duration>,
    frame_latency: Duration,
    frames: Cell<u64>,
}

impl ManualFrameSource {
    /// Create a source with [`DEFAULT_FRAME_LATENCY`] between frames
    #[must_use]
    pub fn new() -> Self {
        Self::with_frame_latency(DEFAULT_FRAME_LATENCY)
    }

    /// Create a source with a custom frame latency.
    ///
    /// A zero latency is raised to one nanosecond so time always progresses.
    #[must_use]
    pub fn with_frame_latency(frame_latency: Duration) -> Self {
        let frame_latency = frame_latency.max(Duration::from_nanos(1));
        Self {
            queue: RefCell::new(FrameQueue::new()),
            now: Cell::new(Duration::ZERO),
            next_frame_at: Cell::new(frame_latency),
            frame_latency,
            frames: Cell::new(0),
        }
    }

    /// Create a source using the config's frame latency, or the default when unset
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidInterval`](crate::IntervalError::InvalidInterval)
    /// if the configured latency is negative or non-finite.
    pub fn from_config(config: &IntervalConfig) -> IntervalResult<Self> {
        Ok(config
            .frame_latency()?
            .map_or_else(Self::new, Self::with_frame_latency))
    }

    /// Advance the clock by `by`, running every frame whose boundary falls
    /// within the window, in order. The clock ends at exactly `now + by`.
    ///
    /// Returns the number of frame callbacks invoked.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get().saturating_add(by);
        let mut fired = 0_usize;

        while self.next_frame_at.get() <= target {
            fired = fired.saturating_add(self.run_frame());
        }

        self.now.set(target);
        fired
    }

    /// Jump straight to the next frame boundary and run it.
    ///
    /// Returns the number of frame callbacks invoked.
    pub fn step_frame(&self) -> usize {
        self.run_frame()
    }

    /// Frame latency between consecutive frames
    #[must_use]
    pub const fn frame_latency(&self) -> Duration {
        self.frame_latency
    }

    /// Wake-ups waiting for the next frame
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Frames run so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }

    fn run_frame(&self) -> usize {
        let timestamp = self.next_frame_at.get();
        self.now.set(timestamp);
        self.next_frame_at
            .set(timestamp.saturating_add(self.frame_latency));
        self.frames.set(self.frames.get().saturating_add(1));

        let fired = FrameQueue::dispatch(&self.queue, timestamp);
        trace!(?timestamp, fired, "Manual frame");
        fired
    }
}

impl Default for ManualFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ManualFrameSource {
    type Handle = FrameId;

    fn now(&self) -> Duration {
        self.now.get()
    }

    fn request_frame(&self, callback: FrameCallback) -> IntervalResult<FrameId> {
        Ok(self.queue.borrow_mut().push(callback))
    }

    fn cancel_frame(&self, handle: FrameId) {
        self.queue.borrow_mut().cancel(handle);
    }
}
