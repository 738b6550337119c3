//! Market data providers
//!
//! # Components
//!
//! - [`client`] - Tinkoff Invest REST gateway client
//! - [`models`] - Request/response data types for the gateway
//! - [`csv_file`] - Candles replayed from local CSV files
//!
//! # Usage
//!
//! ```rust,ignore
//! use flat_breakout::provider::{CandleProvider, TinkoffClient};
//!
//! let client = TinkoffClient::new(token, DEFAULT_BASE_URL.to_string(), Duration::from_secs(30))?;
//! let series = client.get_candles(uid, CandleInterval::OneMinute, from, to).await?;
//! ```

pub mod client;
pub mod csv_file;
pub mod models;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::errors::DetectResult;
use crate::types::{CandleInterval, CandleSeries};

pub use csv_file::CsvProvider;
pub use client::TinkoffClient;

/// Source of historical candles.
///
/// Implementations report failures as `DetectError::DataUnavailable`; they do
/// not retry.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Candles for `instrument_uid` with `from <= timestamp < to`, in order
    async fn get_candles(
        &self,
        instrument_uid: &str,
        interval: CandleInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DetectResult<CandleSeries>;
}

/// `[00:00 UTC date, 00:00 UTC date+1)`
pub fn utc_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
