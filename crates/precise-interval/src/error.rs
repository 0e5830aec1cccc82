//! Error types for interval construction and frame scheduling.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use thiserror::Error;

/// Result alias used throughout the crate
pub type IntervalResult<T> = Result<T, IntervalError>;

/// Errors raised while creating or driving a precise interval
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntervalError {
    /// Interval value is negative or not a finite number
    #[error("invalid interval {value}ms: {reason}")]
    InvalidInterval { value: f64, reason: String },

    /// Configuration could not be parsed or validated
    #[error("invalid interval config: {reason}")]
    InvalidConfig { reason: String },

    /// The frame source has no backing host (e.g. no `window` in a worker)
    #[error("frame source unavailable: {0}")]
    FrameSourceUnavailable(String),

    /// The frame source refused to schedule a wake-up
    #[error("failed to request frame: {0}")]
    RequestFailed(String),
}

impl IntervalError {
    /// Create an invalid interval error
    pub fn invalid_interval(value: f64, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            value,
            reason: reason.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a request failure from any displayable host error
    pub fn request_failed(reason: impl std::fmt::Display) -> Self {
        Self::RequestFailed(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn test_invalid_interval_message_includes_value() {
        let err = IntervalError::invalid_interval(-5.0, "must not be negative");
        assert_eq!(
            err.to_string(),
            "invalid interval -5ms: must not be negative"
        );
    }

    #[test]
    fn test_request_failed_from_display() {
        let err = IntervalError::request_failed("queue closed");
        assert!(matches!(err, IntervalError::RequestFailed(ref s) if s == "queue closed"));
    }
}
