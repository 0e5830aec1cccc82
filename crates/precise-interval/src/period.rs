//! Validated interval periods.

use std::fmt;
use std::time::Duration;

use crate::error::{IntervalError, IntervalResult};

/// Interval between callback invocations, fixed for the lifetime of an interval.
///
/// A zero period is accepted and means "fire on every wake-up".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IntervalPeriod(Duration);

impl IntervalPeriod {
    /// Wrap a duration as a period
    #[must_use]
    #[inline]
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Build a period from fractional milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidInterval`] when `ms` is negative,
    /// NaN, infinite, or too large to represent as a [`Duration`].
    pub fn from_millis_f64(ms: f64) -> IntervalResult<Self> {
        if !ms.is_finite() {
            return Err(IntervalError::invalid_interval(ms, "must be a finite number"));
        }
        if ms < 0.0 {
            return Err(IntervalError::invalid_interval(ms, "must not be negative"));
        }

        Duration::try_from_secs_f64(ms / 1000.0)
            .map(Self)
            .map_err(|e| IntervalError::invalid_interval(ms, e.to_string()))
    }

    /// Underlying duration
    #[must_use]
    #[inline]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Whether this period fires on every wake-up
    #[must_use]
    #[inline]
    pub const fn is_every_frame(self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for IntervalPeriod {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}

impl fmt::Display for IntervalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0.as_secs_f64() * 1000.0)
    }
}
