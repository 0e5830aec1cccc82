//! Behavioral tests for precise intervals on a simulated 16ms frame clock.
//!
//! Covers periodic firing, cancellation (before and after the first firing,
//! repeated), independence of concurrent intervals and drift correction.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use precise_interval::{
    CancelHandle, FrameSource, IntervalError, IntervalState, ManualFrameSource,
    create_precise_interval, create_precise_interval_ms,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Shared invocation counter plus a callback that bumps it.
fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
    let calls = Rc::new(Cell::new(0_u32));
    let inner = Rc::clone(&calls);
    (calls, move || inner.set(inner.get() + 1))
}

fn start(source: &Rc<ManualFrameSource>, period: Duration) -> (Rc<Cell<u32>>, CancelHandle) {
    let (calls, callback) = counter();
    let handle = create_precise_interval(source, callback, period).unwrap();
    (calls, handle)
}

// ==========================================================================
// Concrete scenarios
// ==========================================================================

#[test]
fn test_fires_once_then_cancel_stops_it() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls, handle) = start(&source, ms(1000));

    source.advance(ms(1016));
    assert_eq!(calls.get(), 1);

    handle.cancel();
    source.advance(ms(2000));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_cancel_immediately_never_fires() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls, handle) = start(&source, ms(1000));

    handle.cancel();
    source.advance(ms(2000));

    assert_eq!(calls.get(), 0);
    assert_eq!(source.pending_count(), 0);
}

#[test]
fn test_two_intervals_canceled_in_succession_never_fire() {
    let source = Rc::new(ManualFrameSource::new());
    let calls = Rc::new(Cell::new(0_u32));

    let first_calls = Rc::clone(&calls);
    let first =
        create_precise_interval(&source, move || first_calls.set(first_calls.get() + 1), ms(1000))
            .unwrap();
    let second_calls = Rc::clone(&calls);
    let second =
        create_precise_interval(&source, move || second_calls.set(second_calls.get() + 1), ms(1000))
            .unwrap();

    first.cancel();
    source.advance(ms(500));
    second.cancel();
    source.advance(ms(1500));

    assert_eq!(calls.get(), 0);
}

// ==========================================================================
// Properties
// ==========================================================================

#[test]
fn test_fires_exactly_once_per_period() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls, handle) = start(&source, ms(1000));

    source.advance(ms(992));
    assert_eq!(calls.get(), 0);

    source.advance(ms(16));
    assert_eq!(calls.get(), 1);
    assert_eq!(handle.fire_count(), 1);
}

#[test]
fn test_cancel_is_idempotent() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls, handle) = start(&source, ms(100));

    source.advance(ms(112));
    assert_eq!(calls.get(), 1);

    handle.cancel();
    handle.cancel();
    handle.clone().cancel();

    source.advance(ms(1000));
    assert_eq!(calls.get(), 1);
    assert_eq!(handle.state(), IntervalState::Canceled);
}

#[test]
fn test_canceling_one_interval_leaves_other_running() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls_a, handle_a) = start(&source, ms(1000));
    let (calls_b, handle_b) = start(&source, ms(1000));

    handle_a.cancel();
    source.advance(ms(3000));

    assert_eq!(calls_a.get(), 0);
    assert_eq!(calls_b.get(), 2);
    assert!(!handle_b.is_canceled());
    assert_eq!(source.pending_count(), 1);
}

#[test]
fn test_intervals_created_at_different_times_keep_their_own_anchor() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls_a, _a) = start(&source, ms(100));
    source.advance(ms(50));
    let (calls_b, _b) = start(&source, ms(100));

    // a fires at 112; b was anchored at 50 and first becomes due at 160.
    source.advance(ms(70));
    assert_eq!(calls_a.get(), 1);
    assert_eq!(calls_b.get(), 0);

    source.advance(ms(50));
    assert_eq!(calls_b.get(), 1);
}

#[test]
fn test_drift_does_not_accumulate_over_many_periods() {
    let source = Rc::new(ManualFrameSource::new());
    let fire_times = Rc::new(RefCell::new(Vec::new()));

    let clock = Rc::clone(&source);
    let log = Rc::clone(&fire_times);
    let _handle = create_precise_interval(
        &source,
        move || log.borrow_mut().push(clock.now()),
        ms(100),
    )
    .unwrap();

    source.advance(ms(10_000));

    let times = fire_times.borrow();
    // 10_000ms is a frame boundary (625 * 16ms), so the 100th boundary is hit.
    // A naive reset-to-now loop would fire every 112ms (7 frames) and reach
    // only 89 firings; drift correction keeps the full count.
    assert_eq!(times.len(), 100);
    for (n, at) in times.iter().enumerate() {
        let boundary = ms(100 * (n as u64 + 1));
        assert!(*at >= boundary, "firing {n} at {at:?} before {boundary:?}");
        assert!(*at < boundary + ms(16), "firing {n} at {at:?} lags {boundary:?}");
    }
}

#[test]
fn test_zero_interval_fires_every_frame() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls, _handle) = start(&source, Duration::ZERO);

    source.advance(ms(160));

    assert_eq!(calls.get(), 10);
}

#[test]
fn test_interval_shorter_than_frame_fires_once_per_frame() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls, _handle) = start(&source, ms(5));

    source.advance(ms(160));

    assert_eq!(calls.get(), 10);
}

#[test]
fn test_negative_interval_is_rejected() {
    let source = Rc::new(ManualFrameSource::new());
    let result = create_precise_interval_ms(&source, || {}, -100.0);

    assert!(matches!(result, Err(IntervalError::InvalidInterval { .. })));
    assert_eq!(source.pending_count(), 0);
}

#[test]
fn test_fractional_interval_ms() {
    let source = Rc::new(ManualFrameSource::new());
    let (calls, callback) = counter();
    let _handle = create_precise_interval_ms(&source, callback, 62.5).unwrap();

    source.advance(ms(1000));

    // Boundaries at 62.5ms multiples up to 937.5; the 16th (1000ms) is past the
    // last frame at 992ms.
    assert_eq!(calls.get(), 15);
}

#[test]
fn test_at_most_one_wakeup_pending_per_interval() {
    let source = Rc::new(ManualFrameSource::new());
    let (_calls, handle) = start(&source, ms(50));

    for _ in 0..20 {
        source.step_frame();
        assert_eq!(source.pending_count(), 1);
    }

    handle.cancel();
    assert_eq!(source.pending_count(), 0);
}

#[test]
fn test_panicking_callback_leaves_interval_scheduled() {
    let source = Rc::new(ManualFrameSource::new());
    let calls = Rc::new(Cell::new(0_u32));
    let inner = Rc::clone(&calls);

    let handle = create_precise_interval(
        &source,
        move || {
            inner.set(inner.get() + 1);
            if inner.get() == 1 {
                panic!("first firing fails");
            }
        },
        Duration::ZERO,
    )
    .unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| source.step_frame()));
    assert!(result.is_err());
    assert_eq!(source.pending_count(), 1);

    source.step_frame();
    assert_eq!(calls.get(), 2);
    assert!(!handle.is_canceled());

    handle.cancel();
}
