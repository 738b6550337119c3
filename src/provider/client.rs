//! Tinkoff Invest API Client
//!
//! HTTP client for the Tinkoff Invest REST gateway with bearer-token auth.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::models::{ApiError, GetCandlesRequest, GetCandlesResponse};
use super::CandleProvider;
use crate::errors::{DetectError, DetectResult};
use crate::types::{CandleInterval, CandleSeries};

/// Default REST gateway base URL
pub const DEFAULT_BASE_URL: &str = "https://invest-public-api.tinkoff.ru";

const GET_CANDLES_PATH: &str =
    "/rest/tinkoff.public.invest.api.contract.v1.MarketDataService/GetCandles";

/// Tinkoff Invest market data client
pub struct TinkoffClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TinkoffClient {
    /// Create a new client with explicit credentials
    pub fn new(token: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn candles_url(&self) -> String {
        format!("{}{}", self.base_url, GET_CANDLES_PATH)
    }
}

#[async_trait]
impl CandleProvider for TinkoffClient {
    async fn get_candles(
        &self,
        instrument_uid: &str,
        interval: CandleInterval,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DetectResult<CandleSeries> {
        let request = GetCandlesRequest {
            instrument_id: instrument_uid.to_string(),
            from,
            to,
            interval: interval.api_name().to_string(),
        };

        debug!(
            "GetCandles {} {} [{} .. {})",
            instrument_uid,
            interval.api_name(),
            from,
            to
        );

        let response = self
            .client
            .post(self.candles_url())
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Tinkoff Invest API request failed: {}", e);
                DetectError::unavailable(interval, format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ApiError>(&body) {
                Ok(api_error) => format!(
                    "status {}: {} {} (code: {})",
                    status, api_error.message, api_error.description, api_error.code
                ),
                Err(_) => format!("status {}: {}", status, body),
            };
            warn!("Tinkoff Invest API error: {}", reason);
            return Err(DetectError::unavailable(interval, reason));
        }

        let parsed: GetCandlesResponse = response.json().await.map_err(|e| {
            DetectError::unavailable(interval, format!("failed to parse candles: {}", e))
        })?;

        let candles = parsed.candles.iter().map(|c| c.to_candle()).collect();
        CandleSeries::new(interval, candles)
    }
}
