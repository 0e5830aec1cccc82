//! `requestAnimationFrame`-backed frame source for browser hosts.
//!
//! One persistent closure is registered with the browser; each animation
//! frame drains the pending wake-ups and re-arms itself only while wake-ups
//! remain, so an idle source costs nothing.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{error, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Performance, Window};

use crate::error::{IntervalError, IntervalResult};
use crate::source::{FrameCallback, FrameId, FrameQueue, FrameSource};

/// Shared state between the source and its animation frame closure
struct RafState {
    window: Window,
    performance: Performance,
    queue: RefCell<FrameQueue>,
    request_id: Cell<Option<i32>>,
    closure: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl RafState {
    /// Request an animation frame if wake-ups are waiting and none is outstanding
    fn ensure_scheduled(&self) -> IntervalResult<()> {
        if self.request_id.get().is_some() || self.queue.borrow().is_empty() {
            return Ok(());
        }

        let id = self
            .closure
            .borrow()
            .as_ref()
            .ok_or_else(|| {
                IntervalError::FrameSourceUnavailable("animation frame closure released".into())
            })
            .and_then(|cb| {
                self.window
                    .request_animation_frame(cb.as_ref().unchecked_ref())
                    .map_err(|e| IntervalError::request_failed(format!("{e:?}")))
            })?;

        self.request_id.set(Some(id));
        Ok(())
    }

    fn on_animation_frame(&self, timestamp_ms: f64) {
        self.request_id.set(None);
        FrameQueue::dispatch(&self.queue, millis_to_duration(timestamp_ms));

        if let Err(err) = self.ensure_scheduled() {
            error!(error = %err, "Failed to re-arm animation frame");
        }
    }

    fn withdraw(&self) {
        if let Some(id) = self.request_id.take() {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                warn!(error = ?e, "Failed to cancel animation frame");
            }
        }
    }
}

/// Frame source backed by `window.requestAnimationFrame`
pub struct AnimationFrameSource {
    state: Rc<RafState>,
}

impl AnimationFrameSource {
    /// Bind to the current window.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::FrameSourceUnavailable`] when there is no
    /// `window` (e.g. inside a worker) or it exposes no `performance` clock.
    pub fn new() -> IntervalResult<Self> {
        let window = web_sys::window().ok_or_else(|| {
            IntervalError::FrameSourceUnavailable("window is not available".into())
        })?;
        let performance = window.performance().ok_or_else(|| {
            IntervalError::FrameSourceUnavailable("performance is not available".into())
        })?;

        let state = Rc::new(RafState {
            window,
            performance,
            queue: RefCell::new(FrameQueue::new()),
            request_id: Cell::new(None),
            closure: RefCell::new(None),
        });

        let weak: Weak<RafState> = Rc::downgrade(&state);
        *state.closure.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            if let Some(state) = weak.upgrade() {
                state.on_animation_frame(timestamp);
            }
        }) as Box<dyn FnMut(f64)>));

        Ok(Self { state })
    }

    /// Wake-ups waiting for the next animation frame
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.queue.borrow().len()
    }
}

impl FrameSource for AnimationFrameSource {
    type Handle = FrameId;

    fn now(&self) -> Duration {
        millis_to_duration(self.state.performance.now())
    }

    fn request_frame(&self, callback: FrameCallback) -> IntervalResult<FrameId> {
        let id = self.state.queue.borrow_mut().push(callback);
        if let Err(err) = self.state.ensure_scheduled() {
            self.state.queue.borrow_mut().cancel(id);
            return Err(err);
        }
        Ok(id)
    }

    fn cancel_frame(&self, handle: FrameId) {
        let now_idle = {
            let mut queue = self.state.queue.borrow_mut();
            queue.cancel(handle);
            queue.is_empty()
        };
        if now_idle {
            self.state.withdraw();
        }
    }
}

impl Drop for AnimationFrameSource {
    fn drop(&mut self) {
        self.state.withdraw();
    }
}

fn millis_to_duration(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::ZERO)
}
