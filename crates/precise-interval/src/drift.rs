//! Drift correction for frame-driven intervals.
//!
//! Frame wake-ups rarely land exactly on an interval boundary. Instead of
//! resetting the reference timestamp to the wake-up time (which would lose the
//! overshoot every period), the anchor moves to the last exact boundary that
//! has passed: `now - (elapsed mod period)`.

use std::time::Duration;

use crate::period::IntervalPeriod;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Outcome of a due wake-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    /// New reference timestamp
    pub anchor: Duration,
    /// Time since the previous anchor
    pub elapsed: Duration,
    /// Portion of `elapsed` past the last interval boundary, carried forward
    pub overshoot: Duration,
}

/// Decide whether a wake-up at `now` is due and where the anchor moves.
///
/// Returns `None` when less than one period has elapsed since `last_fire`.
/// The returned anchor is never earlier than `last_fire`.
#[must_use]
pub fn reanchor(last_fire: Duration, now: Duration, period: IntervalPeriod) -> Option<Firing> {
    let period = period.as_duration();
    let elapsed = now.saturating_sub(last_fire);

    if elapsed < period {
        return None;
    }

    let overshoot = if period.is_zero() {
        Duration::ZERO
    } else {
        elapsed
            .as_nanos()
            .checked_rem(period.as_nanos())
            .map_or(Duration::ZERO, duration_from_nanos)
    };

    Some(Firing {
        anchor: now.saturating_sub(overshoot).max(last_fire),
        elapsed,
        overshoot,
    })
}

fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    let subsec = u32::try_from(nanos % NANOS_PER_SEC).unwrap_or(0);
    Duration::new(secs, subsec)
}
