use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{DetectError, DetectResult};
use crate::runner::PatternRunner;
use crate::trading_core::PatternResult;

/// One OHLC bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    /// Check prices and volume are finite, non-negative and the bar is
    /// internally consistent
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a finite non-negative number, got {}", name, value));
            }
        }
        if self.low > self.open.min(self.close) {
            return Err(format!(
                "low {} is above open/close ({} / {})",
                self.low, self.open, self.close
            ));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!(
                "high {} is below open/close ({} / {})",
                self.high, self.open, self.close
            ));
        }
        Ok(())
    }
}

/// Candle timeframe requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    OneMinute,
    FiveMinute,
}

impl CandleInterval {
    /// Interval name used by the Tinkoff Invest API
    pub fn api_name(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "CANDLE_INTERVAL_1_MIN",
            CandleInterval::FiveMinute => "CANDLE_INTERVAL_5_MIN",
        }
    }

    /// Short suffix used in file names and response keys
    pub fn short_name(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinute => "5m",
        }
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandleInterval::OneMinute => write!(f, "1min"),
            CandleInterval::FiveMinute => write!(f, "5min"),
        }
    }
}

/// Ordered candles for one instrument, one day, one timeframe.
///
/// Timestamps are strictly increasing. An empty series is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, rejecting malformed bars and out-of-order or
    /// duplicate timestamps
    pub fn new(interval: CandleInterval, candles: Vec<Candle>) -> DetectResult<Self> {
        for (index, candle) in candles.iter().enumerate() {
            candle.validate().map_err(|reason| {
                DetectError::unavailable(interval, format!("candle {}: {}", index, reason))
            })?;
        }

        if let Some(pos) = candles
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(DetectError::unavailable(
                interval,
                format!(
                    "timestamp {} at index {} does not follow {}",
                    candles[pos + 1].timestamp,
                    pos + 1,
                    candles[pos].timestamp
                ),
            ));
        }
        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

/// Four pattern results for one ticker and day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedResponse {
    pub ticker: String,
    pub date: NaiveDate,
    pub flat_top_1min: PatternResult,
    pub flat_bottom_1min: PatternResult,
    pub flat_top_5min: PatternResult,
    pub flat_bottom_5min: PatternResult,
}

impl CombinedResponse {
    pub fn triggered_count(&self) -> usize {
        [
            &self.flat_top_1min,
            &self.flat_bottom_1min,
            &self.flat_top_5min,
            &self.flat_bottom_5min,
        ]
        .iter()
        .filter(|r| r.is_triggered())
        .count()
    }
}

/// Shared application state
pub struct AppState {
    pub runner: PatternRunner,
    /// Deadline for one whole detection request
    pub request_timeout: Duration,
}
