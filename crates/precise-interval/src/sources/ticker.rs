//! Frame source for native async hosts.
//!
//! Frames are produced by a tokio [`Interval`](tokio::time::Interval) ticking
//! at a display-like cadence. The source is single-threaded: drive it from the
//! task (or `LocalSet`) that owns the intervals built on it.

use std::cell::RefCell;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

use crate::config::IntervalConfig;
use crate::error::IntervalResult;
use crate::source::{FrameCallback, FrameId, FrameQueue, FrameSource};

/// Frame latency of a 60Hz display
pub const DEFAULT_FRAME_LATENCY: Duration = Duration::from_micros(16_667);

/// Shortest frame latency accepted by the ticker
const MIN_FRAME_LATENCY: Duration = Duration::from_millis(1);

/// Frame source ticking on tokio's timer
#[derive(Debug)]
pub struct TokioFrameSource {
    queue: RefCell<FrameQueue>,
    origin: Instant,
    frame_latency: Duration,
}

impl TokioFrameSource {
    /// Create a source ticking at [`DEFAULT_FRAME_LATENCY`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_frame_latency(DEFAULT_FRAME_LATENCY)
    }

    /// Create a source ticking every `frame_latency` (at least 1ms)
    #[must_use]
    pub fn with_frame_latency(frame_latency: Duration) -> Self {
        Self {
            queue: RefCell::new(FrameQueue::new()),
            origin: Instant::now(),
            frame_latency: frame_latency.max(MIN_FRAME_LATENCY),
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

    /// Frame latency between ticks
    #[must_use]
    pub const fn frame_latency(&self) -> Duration {
        self.frame_latency
    }

    /// Wake-ups waiting for the next frame
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run frames until no wake-ups remain pending.
    ///
    /// Every active interval keeps one wake-up pending, so this returns once
    /// all intervals on this source have been canceled. Late ticks are
    /// delayed rather than bunched, like a display skipping frames.
    ///
    /// Returns the number of frames run.
    pub async fn drive(&self) -> u64 {
        let start = Instant::now()
            .checked_add(self.frame_latency)
            .unwrap_or_else(Instant::now);
        let mut ticker = interval_at(start, self.frame_latency);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut frames = 0_u64;
        debug!(latency = ?self.frame_latency, "Frame loop starting");

        while !self.queue.borrow().is_empty() {
            ticker.tick().await;
            let timestamp = self.now();
            let fired = FrameQueue::dispatch(&self.queue, timestamp);
            frames = frames.saturating_add(1);
            trace!(?timestamp, fired, "Tokio frame");
        }

        debug!(frames, "Frame loop idle");
        frames
    }
}

impl Default for TokioFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for TokioFrameSource {
    type Handle = FrameId;

    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }

    fn request_frame(&self, callback: FrameCallback) -> IntervalResult<FrameId> {
        Ok(self.queue.borrow_mut().push(callback))
    }

    fn cancel_frame(&self, handle: FrameId) {
        self.queue.borrow_mut().cancel(handle);
    }
}
