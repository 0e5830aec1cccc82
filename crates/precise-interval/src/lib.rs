//! Precise Interval - drift-corrected repeating callbacks on frame wake-ups
//!
//! Frame-synchronized wake-ups (`requestAnimationFrame`, a display-paced
//! ticker, a simulated clock) arrive on the frame cadence, not on the interval
//! you asked for. This crate runs a callback every `period` on top of such a
//! source and re-anchors its reference timestamp to the last exact interval
//! boundary after each firing, so the overshoot of one period is credited to
//! the next and error never accumulates.
//!
//! # Pieces
//!
//! - [`FrameSource`]: the injected wake-up capability (request / withdraw)
//! - [`create_precise_interval`]: start an interval, get a [`CancelHandle`]
//! - [`ManualFrameSource`]: deterministic simulated frames for tests
//! - `TokioFrameSource` (feature `tokio`, default): frames from tokio's timer
//! - `AnimationFrameSource` (feature `web`): `window.requestAnimationFrame`
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! use precise_interval::{ManualFrameSource, create_precise_interval};
//!
//! # fn main() -> Result<(), precise_interval::IntervalError> {
//! let frames = Rc::new(ManualFrameSource::new());
//! let fired = Rc::new(Cell::new(0_u32));
//! let counter = Rc::clone(&fired);
//!
//! let handle = create_precise_interval(
//!     &frames,
//!     move || counter.set(counter.get() + 1),
//!     Duration::from_millis(100),
//! )?;
//!
//! frames.advance(Duration::from_millis(1000));
//! assert_eq!(fired.get(), 9);
//!
//! handle.cancel();
//! handle.cancel(); // no-op
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//!
//! Everything here is single-threaded and cooperative: state lives in
//! `Rc<RefCell<_>>`, so intervals and sources are `!Send` and must be driven
//! from the thread (or `LocalSet`) that created them.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod config;
pub mod drift;
mod error;
mod period;
mod scheduler;
mod source;
pub mod sources;

pub use config::IntervalConfig;
pub use error::{IntervalError, IntervalResult};
pub use period::IntervalPeriod;
pub use scheduler::{
    CancelHandle, IntervalState, create_fallible_precise_interval, create_precise_interval,
    create_precise_interval_ms,
};
pub use source::{FrameCallback, FrameId, FrameQueue, FrameSource};
pub use sources::ManualFrameSource;
#[cfg(feature = "web")]
pub use sources::AnimationFrameSource;
#[cfg(feature = "tokio")]
pub use sources::TokioFrameSource;
