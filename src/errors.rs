//! Error types for pattern detection

use std::time::Duration;
use thiserror::Error;

use crate::types::CandleInterval;

/// Failures surfaced by the runner, providers, and HTTP layer.
///
/// "No pattern found" is never an error; it is a `NotTriggered` result.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Malformed ticker, uid or date
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider unreachable, instrument unknown, malformed or missing candles
    #[error("no {interval} candle data available: {reason}")]
    DataUnavailable {
        interval: CandleInterval,
        reason: String,
    },

    /// Whole request exceeded its deadline
    #[error("detection timed out after {0:?}")]
    Timeout(Duration),
}

pub type DetectResult<T> = Result<T, DetectError>;

impl DetectError {
    pub fn unavailable(interval: CandleInterval, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            interval,
            reason: reason.into(),
        }
    }

    /// Whether the caller sent bad input (as opposed to an upstream failure)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
