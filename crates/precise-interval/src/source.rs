//! Frame-synchronized wake-up sources.
//!
//! A [`FrameSource`] is the injected capability the interval loop runs on:
//! it hands out one-shot wake-ups aligned to some frame cadence (a display
//! refresh, a simulated clock, a tokio ticker) and lets them be withdrawn.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tracing::trace;

use crate::error::IntervalResult;

/// One-shot wake-up callback, invoked with the frame timestamp
pub type FrameCallback = Box<dyn FnOnce(Duration)>;

/// Frame-synchronized wake-up primitive.
///
/// Timestamps are offsets from the source's own monotonic origin.
pub trait FrameSource {
    /// Opaque token identifying a pending wake-up
    type Handle: Copy + Eq + fmt::Debug;

    /// Current timestamp of the source clock
    fn now(&self) -> Duration;

    /// Schedule `callback` to run on the next frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to schedule the wake-up.
    fn request_frame(&self, callback: FrameCallback) -> IntervalResult<Self::Handle>;

    /// Withdraw a pending wake-up. Unknown or already-fired handles are ignored
    fn cancel_frame(&self, handle: Self::Handle);
}

/// Handle issued by the bundled frame sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(u64);

impl FrameId {
    /// Raw numeric value
    #[must_use]
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// Pending wake-ups of a frame source, in request order
#[derive(Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: BTreeMap<FrameId, FrameCallback>,
}

impl FrameQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a wake-up for the next dispatched frame
    pub fn push(&mut self, callback: FrameCallback) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.insert(id, callback);
        id
    }

    /// Withdraw a wake-up. Returns `false` if it already fired or never existed
    pub fn cancel(&mut self, id: FrameId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Number of wake-ups still waiting for a frame
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no wake-ups are waiting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run one frame: every wake-up pending when the frame begins fires once.
    ///
    /// Wake-ups requested while the frame runs wait for the next frame.
    /// Wake-ups withdrawn by an earlier callback in the same frame are skipped.
    /// The queue is never borrowed while a callback runs, so callbacks may
    /// freely push to or cancel from it.
    ///
    /// Returns the number of callbacks invoked.
    pub fn dispatch(queue: &RefCell<Self>, timestamp: Duration) -> usize {
        let due: Vec<FrameId> = queue.borrow().pending.keys().copied().collect();
        let mut fired = 0_usize;

        for id in due {
            let callback = queue.borrow_mut().pending.remove(&id);
            if let Some(callback) = callback {
                trace!(frame = %id, ?timestamp, "Dispatching frame callback");
                callback(timestamp);
                fired = fired.saturating_add(1);
            }
        }

        fired
    }
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("next_id", &self.next_id)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}
