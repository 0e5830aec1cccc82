//! Interval configuration loaded from TOML.
//!
//! ```toml
//! interval_ms = 1000
//! frame_latency_ms = 16
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IntervalError, IntervalResult};
use crate::period::IntervalPeriod;

/// Declarative description of an interval and the frame cadence driving it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalConfig {
    /// Target interval in milliseconds
    pub interval_ms: f64,
    /// Frame latency of the driving source, if it should be overridden
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_latency_ms: Option<f64>,
}

impl IntervalConfig {
    /// Config for `interval_ms` with the source's default frame latency
    #[must_use]
    pub const fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            frame_latency_ms: None,
        }
    }

    /// Override the frame latency
    #[must_use]
    pub const fn with_frame_latency_ms(mut self, frame_latency_ms: f64) -> Self {
        self.frame_latency_ms = Some(frame_latency_ms);
        self
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidConfig`] if the document does not parse,
    /// or [`IntervalError::InvalidInterval`] if a value is out of range.
    pub fn from_toml_str(input: &str) -> IntervalResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| IntervalError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check both values without building anything.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidInterval`] if a value is out of range.
    pub fn validate(&self) -> IntervalResult<()> {
        self.period()?;
        self.frame_latency()?;
        Ok(())
    }

    /// Validated interval period.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidInterval`] for negative or non-finite values.
    pub fn period(&self) -> IntervalResult<IntervalPeriod> {
        IntervalPeriod::from_millis_f64(self.interval_ms)
    }

    /// Validated frame latency override, if any.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidInterval`] for negative or non-finite values.
    pub fn frame_latency(&self) -> IntervalResult<Option<Duration>> {
        self.frame_latency_ms
            .map(|ms| IntervalPeriod::from_millis_f64(ms).map(IntervalPeriod::as_duration))
            .transpose()
    }
}
