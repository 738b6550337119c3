//! Pattern runner: fetch a day of candles and run the four scans
//!
//! Top and bottom scans over the 1-minute and 5-minute series are independent
//! pure functions over borrowed candles; they run inline after both fetches.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{DetectError, DetectResult};
use crate::provider::{utc_day_bounds, CandleProvider};
use crate::trading_core::{FlatScanner, PatternResult};
use crate::types::{CandleInterval, CandleSeries, CombinedResponse};

/// Configuration for the pattern runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Treat a provider returning zero candles as "no pattern" instead of
    /// `DataUnavailable` (default: false)
    pub allow_empty_series: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            allow_empty_series: false,
        }
    }
}

/// Runs flat-top / flat-bottom detection for one ticker and day
pub struct PatternRunner {
    provider: Arc<dyn CandleProvider>,
    config: RunnerConfig,
}

impl PatternRunner {
    pub fn new(provider: Arc<dyn CandleProvider>, config: RunnerConfig) -> Self {
        Self { provider, config }
    }

    /// Fetch 1-minute and 5-minute candles for `date` and scan both
    pub async fn detect(
        &self,
        ticker: &str,
        instrument_uid: &str,
        date: NaiveDate,
    ) -> DetectResult<CombinedResponse> {
        let ticker = validate_ticker(ticker)?;
        let instrument_uid = validate_uid(instrument_uid)?;

        let (series_1m, series_5m) = tokio::join!(
            self.fetch(instrument_uid, CandleInterval::OneMinute, date),
            self.fetch(instrument_uid, CandleInterval::FiveMinute, date),
        );
        let series_1m = series_1m?;
        let series_5m = series_5m?;

        info!(
            "Fetched {} candles (1min) and {} candles (5min) for {} on {}",
            series_1m.len(),
            series_5m.len(),
            ticker,
            date
        );

        let (flat_top_1min, flat_bottom_1min) = scan_series(&series_1m);
        let (flat_top_5min, flat_bottom_5min) = scan_series(&series_5m);

        let response = CombinedResponse {
            ticker: ticker.to_string(),
            date,
            flat_top_1min,
            flat_bottom_1min,
            flat_top_5min,
            flat_bottom_5min,
        };

        log_triggers(&response);
        Ok(response)
    }

    async fn fetch(
        &self,
        instrument_uid: &str,
        interval: CandleInterval,
        date: NaiveDate,
    ) -> DetectResult<CandleSeries> {
        let (from, to) = utc_day_bounds(date);
        let series = self
            .provider
            .get_candles(instrument_uid, interval, from, to)
            .await
            .inspect_err(|e| warn!("Candle fetch failed: {}", e))?;

        if series.is_empty() && !self.config.allow_empty_series {
            warn!("No {} candles for {} on {}", interval, instrument_uid, date);
            return Err(DetectError::unavailable(
                interval,
                format!("no candles for {}", date),
            ));
        }

        Ok(series)
    }
}

/// Top and bottom scans over one series
pub fn scan_series(series: &CandleSeries) -> (PatternResult, PatternResult) {
    (
        FlatScanner::top().scan(series.candles()),
        FlatScanner::bottom().scan(series.candles()),
    )
}

fn log_triggers(response: &CombinedResponse) {
    let results = [
        ("Flat-Top 1min", &response.flat_top_1min),
        ("Flat-Bottom 1min", &response.flat_bottom_1min),
        ("Flat-Top 5min", &response.flat_top_5min),
        ("Flat-Bottom 5min", &response.flat_bottom_5min),
    ];

    for (name, result) in results {
        if let PatternResult::Triggered {
            entry_price,
            stop_price,
            trigger_time,
        } = result
        {
            info!(
                "{} {} triggered at {} level={:.4}, stop={:.4}",
                response.ticker,
                name,
                trigger_time.to_rfc3339(),
                entry_price,
                stop_price
            );
        }
    }

    info!(
        "{} on {}: {} of {} patterns triggered",
        response.ticker,
        response.date,
        response.triggered_count(),
        results.len()
    );
}

/// Parse a `YYYY-MM-DD` trade date
pub fn parse_trade_date(raw: &str) -> DetectResult<NaiveDate> {
    let well_formed = raw.len() == 10
        && raw.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(DetectError::InvalidRequest(format!(
            "date must be YYYY-MM-DD, got {:?}",
            raw
        )));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| DetectError::InvalidRequest(format!("invalid date {:?}: {}", raw, e)))
}

fn validate_ticker(raw: &str) -> DetectResult<&str> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(DetectError::InvalidRequest("ticker is empty".to_string()));
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(DetectError::InvalidRequest(format!(
            "ticker {:?} contains invalid characters",
            ticker
        )));
    }
    Ok(ticker)
}

fn validate_uid(raw: &str) -> DetectResult<&str> {
    if raw.is_empty() || raw.chars().any(char::is_whitespace) {
        return Err(DetectError::InvalidRequest(format!(
            "instrument uid {:?} is empty or contains whitespace",
            raw
        )));
    }
    Ok(raw)
}
