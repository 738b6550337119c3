//! Tinkoff Invest REST gateway data types
//!
//! The gateway uses the protobuf JSON mapping: camelCase names, and 64-bit
//! integers encoded as strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::Candle;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCandlesRequest {
    pub instrument_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub interval: String,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GetCandlesResponse {
    #[serde(default)]
    pub candles: Vec<HistoricCandle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricCandle {
    pub open: Quotation,
    pub high: Quotation,
    pub low: Quotation,
    pub close: Quotation,
    #[serde(default, deserialize_with = "int64")]
    pub volume: i64,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub is_complete: bool,
}

impl HistoricCandle {
    pub fn to_candle(&self) -> Candle {
        Candle {
            open: self.open.to_f64(),
            high: self.high.to_f64(),
            low: self.low.to_f64(),
            close: self.close.to_f64(),
            volume: self.volume as f64,
            timestamp: self.time,
        }
    }
}

/// Fixed-point price: `units + nano / 1e9`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Quotation {
    #[serde(default, deserialize_with = "int64")]
    pub units: i64,
    #[serde(default)]
    pub nano: i32,
}

impl Quotation {
    pub fn to_f64(&self) -> f64 {
        self.units as f64 + self.nano as f64 / 1e9
    }
}

/// Gateway error body
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub description: String,
}

fn int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Int(i64),
        Str(String),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Int(v) => Ok(v),
        StringOrInt::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
