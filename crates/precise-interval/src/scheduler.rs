//! Drift-corrected interval loop on top of a [`FrameSource`].
//!
//! Each instance keeps a reference timestamp, requests one wake-up at a time
//! from its frame source, and fires the callback whenever at least one full
//! period has passed since that timestamp. Overshoot is credited to the next
//! period (see [`crate::drift`]), so firings settle onto an arithmetic
//! progression of the period even though the source ticks at its own cadence.
//!
//! # Callback faults
//!
//! The next wake-up is requested and the anchor moved *before* the callback
//! runs. A panicking callback therefore unwinds into whatever drives the frame
//! source, but the interval itself stays consistent and keeps running until it
//! is canceled. Fallible callbacks ([`create_fallible_precise_interval`]) have
//! their errors logged and the loop continues.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, trace, warn};

use crate::drift;
use crate::error::IntervalResult;
use crate::period::IntervalPeriod;
use crate::source::FrameSource;

/// Interval callback
type IntervalCallback = Box<dyn FnMut()>;

/// Lifecycle of an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalState {
    /// Wake-ups keep getting requested
    Active,
    /// Terminal: no more wake-ups are requested or honored
    Canceled,
}

impl IntervalState {
    /// Whether the interval is still running
    #[must_use]
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Mutable loop state, never borrowed while user code runs
struct LoopState<H> {
    state: IntervalState,
    last_fire: Duration,
    pending: Option<H>,
}

struct PreciseInterval<S: FrameSource> {
    source: Rc<S>,
    period: IntervalPeriod,
    state: RefCell<LoopState<S::Handle>>,
    callback: RefCell<Option<IntervalCallback>>,
    fired: Cell<u64>,
}

impl<S: FrameSource + 'static> PreciseInterval<S> {
    fn request_next(this: &Rc<Self>) -> IntervalResult<()> {
        let instance = Rc::clone(this);
        let handle = this
            .source
            .request_frame(Box::new(move |now: Duration| instance.on_frame(now)))?;
        this.state.borrow_mut().pending = Some(handle);
        Ok(())
    }

    fn on_frame(self: &Rc<Self>, now: Duration) {
        let firing = {
            let mut loop_state = self.state.borrow_mut();
            loop_state.pending = None;

            if loop_state.state == IntervalState::Canceled {
                trace!(?now, "Dropping wake-up for canceled interval");
                return;
            }

            let firing = drift::reanchor(loop_state.last_fire, now, self.period);
            if let Some(firing) = firing {
                loop_state.last_fire = firing.anchor;
            }
            firing
        };

        if let Err(err) = Self::request_next(self) {
            error!(error = %err, period = %self.period, "Failed to request next frame, canceling interval");
            self.state.borrow_mut().state = IntervalState::Canceled;
        }

        if let Some(firing) = firing {
            self.invoke_callback(firing);
        }
    }

    /// A firing whose callback is already running further up the stack is
    /// skipped and not counted.
    fn invoke_callback(&self, firing: drift::Firing) {
        match self.callback.try_borrow_mut() {
            Ok(mut slot) => {
                if let Some(callback) = slot.as_mut() {
                    self.fired.set(self.fired.get().saturating_add(1));
                    trace!(
                        elapsed = ?firing.elapsed,
                        overshoot = ?firing.overshoot,
                        fired = self.fired.get(),
                        "Interval firing"
                    );
                    callback();
                }
                if !self.state.borrow().state.is_active() {
                    slot.take();
                }
            }
            Err(_) => warn!("Interval callback re-entered from its own frame, skipping"),
        }
    }
}

/// Type-erased control surface behind [`CancelHandle`]
trait IntervalControl {
    fn cancel(&self);
    fn state(&self) -> IntervalState;
    fn fire_count(&self) -> u64;
    fn period(&self) -> IntervalPeriod;
}

impl<S: FrameSource> IntervalControl for PreciseInterval<S> {
    fn cancel(&self) {
        let pending = {
            let mut loop_state = self.state.borrow_mut();
            if loop_state.state == IntervalState::Canceled {
                return;
            }
            loop_state.state = IntervalState::Canceled;
            loop_state.pending.take()
        };

        if let Some(handle) = pending {
            self.source.cancel_frame(handle);
        }

        // Release the callback (and anything it captured) unless it is the
        // one currently running; in that case it is released once it returns.
        if let Ok(mut slot) = self.callback.try_borrow_mut() {
            slot.take();
        }

        debug!(
            period = %self.period,
            fired = self.fired.get(),
            "Precise interval canceled"
        );
    }

    fn state(&self) -> IntervalState {
        self.state.borrow().state
    }

    fn fire_count(&self) -> u64 {
        self.fired.get()
    }

    fn period(&self) -> IntervalPeriod {
        self.period
    }
}

/// Caller-held handle that stops an interval.
///
/// Clones control the same interval. Dropping the handle does not cancel:
/// the interval keeps running until [`CancelHandle::cancel`] is called.
#[derive(Clone)]
pub struct CancelHandle {
    control: Rc<dyn IntervalControl>,
}

impl CancelHandle {
    /// Stop the interval. Calling this again is a no-op.
    ///
    /// The pending wake-up is withdrawn from the frame source; a wake-up that
    /// is already in flight is dropped without running the callback.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has taken effect
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        !self.control.state().is_active()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> IntervalState {
        self.control.state()
    }

    /// Number of times the callback has been invoked
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.control.fire_count()
    }

    /// Period the interval was created with
    #[must_use]
    pub fn period(&self) -> IntervalPeriod {
        self.control.period()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("state", &self.state())
            .field("period", &self.period())
            .field("fired", &self.fire_count())
            .finish()
    }
}

/// Start an interval that calls `callback` every `period`, driven by `source`.
///
/// The reference timestamp is taken from `source.now()` and the first wake-up
/// is requested before this returns.
///
/// # Errors
///
/// Returns an error if the frame source refuses the first wake-up request.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// use precise_interval::{ManualFrameSource, create_precise_interval};
///
/// let source = Rc::new(ManualFrameSource::new());
/// let ticks = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&ticks);
///
/// let handle = create_precise_interval(
///     &source,
///     move || counter.set(counter.get() + 1),
///     Duration::from_millis(1000),
/// )?;
///
/// source.advance(Duration::from_millis(1016));
/// assert_eq!(ticks.get(), 1);
///
/// handle.cancel();
/// source.advance(Duration::from_millis(2000));
/// assert_eq!(ticks.get(), 1);
/// # Ok::<(), precise_interval::IntervalError>(())
/// ```
pub fn create_precise_interval<S, F>(
    source: &Rc<S>,
    callback: F,
    period: impl Into<IntervalPeriod>,
) -> IntervalResult<CancelHandle>
where
    S: FrameSource + 'static,
    F: FnMut() + 'static,
{
    let period = period.into();
    let interval = Rc::new(PreciseInterval {
        source: Rc::clone(source),
        period,
        state: RefCell::new(LoopState {
            state: IntervalState::Active,
            last_fire: source.now(),
            pending: None,
        }),
        callback: RefCell::new(Some(Box::new(callback))),
        fired: Cell::new(0),
    });

    PreciseInterval::request_next(&interval)?;
    debug!(period = %period, every_frame = period.is_every_frame(), "Precise interval created");

    Ok(CancelHandle { control: interval })
}

/// Like [`create_precise_interval`], with the period in fractional milliseconds.
///
/// # Errors
///
/// Returns [`IntervalError::InvalidInterval`](crate::IntervalError::InvalidInterval)
/// for negative or non-finite values, or an error from the frame source.
pub fn create_precise_interval_ms<S, F>(
    source: &Rc<S>,
    callback: F,
    interval_ms: f64,
) -> IntervalResult<CancelHandle>
where
    S: FrameSource + 'static,
    F: FnMut() + 'static,
{
    let period = IntervalPeriod::from_millis_f64(interval_ms)?;
    create_precise_interval(source, callback, period)
}

/// Start an interval whose callback may fail.
///
/// Errors are logged at `warn` level and the interval keeps running.
///
/// # Errors
///
/// Returns an error if the frame source refuses the first wake-up request.
pub fn create_fallible_precise_interval<S, F, E>(
    source: &Rc<S>,
    mut callback: F,
    period: impl Into<IntervalPeriod>,
) -> IntervalResult<CancelHandle>
where
    S: FrameSource + 'static,
    F: FnMut() -> Result<(), E> + 'static,
    E: fmt::Display,
{
    create_precise_interval(
        source,
        move || {
            if let Err(err) = callback() {
                warn!(error = %err, "Interval callback failed, continuing");
            }
        },
        period,
    )
}
