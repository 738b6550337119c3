//! Candles replayed from CSV exports
//!
//! Layout: one file per instrument and timeframe, `<dir>/<uid>_<1m|5m>.csv`,
//! with header `timestamp,open,high,low,close,volume`, RFC 3339 timestamps in
//! ascending order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::CandleProvider;
use crate::errors::{DetectError, DetectResult};
use crate::types::{Candle, CandleInterval, CandleSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Reads candle files from a local directory
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_path(&self, instrument_uid: &str, interval: CandleInterval) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", instrument_uid, interval.short_name()))
    }
}

/// Parse candle rows, keeping those inside `[from, to)`
pub fn parse_candles(
    data: &[u8],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Candle>, String> {
    let mut reader = csv::Reader::from_reader(data);
    let mut candles = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(|e| format!("row {}: {}", line + 1, e))?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| format!("row {}: bad timestamp {}: {}", line + 1, row.timestamp, e))?
            .with_timezone(&Utc);

        if timestamp < from || timestamp >= to {
            continue;
        }

        let candle = Candle {
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            timestamp,
        };
        candle
            .validate()
            .map_err(|e| format!("row {}: {}", line + 1, e))?;
        candles.push(candle);
    }

    Ok(candles)
}

async fn read_file(path: &Path, interval: CandleInterval) -> DetectResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| DetectError::unavailable(interval, format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl CandleProvider for CsvProvider {
    async fn get_candles(
        &self,
        instrument_uid: &str,
        interval: CandleInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DetectResult<CandleSeries> {
        let path = self.file_path(instrument_uid, interval);
        let data = read_file(&path, interval).await?;

        let candles = parse_candles(&data, from, to).map_err(|e| {
            DetectError::unavailable(interval, format!("{}: {}", path.display(), e))
        })?;
        debug!("Loaded {} candles from {}", candles.len(), path.display());

        CandleSeries::new(interval, candles)
    }
}
