//! Command-line / environment configuration shared by the binaries

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::client::DEFAULT_BASE_URL;
use crate::provider::{CandleProvider, CsvProvider, TinkoffClient};
use crate::runner::RunnerConfig;

/// Where candles come from and how the runner treats them
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Tinkoff Invest API token
    #[arg(long, env = "TINKOFF_INVEST_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Tinkoff Invest REST gateway base URL
    #[arg(long, env = "TINKOFF_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// HTTP timeout for market data calls, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,

    /// Read candles from `<dir>/<uid>_<1m|5m>.csv` instead of the API
    #[arg(long, env = "CANDLE_CSV_DIR")]
    pub csv_dir: Option<PathBuf>,

    /// Treat a day with no candles as "no pattern" rather than an error
    #[arg(long, env = "ALLOW_EMPTY_SERIES")]
    pub allow_empty_series: bool,
}

impl ProviderArgs {
    /// CSV provider when a directory is given, Tinkoff otherwise
    pub fn build_provider(&self) -> Result<Arc<dyn CandleProvider>> {
        if let Some(dir) = &self.csv_dir {
            return Ok(Arc::new(CsvProvider::new(dir)));
        }

        let token = self
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .context("TINKOFF_INVEST_TOKEN is not set (or pass --csv-dir)")?;
        let client = TinkoffClient::new(
            token,
            self.base_url.clone(),
            Duration::from_secs(self.http_timeout_secs),
        )?;
        Ok(Arc::new(client))
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            allow_empty_series: self.allow_empty_series,
        }
    }
}

/// HTTP server settings
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to run the web server on
    #[arg(short, long, env = "PORT", default_value = "8003")]
    pub port: u16,

    /// Deadline for one detection request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,
}

impl ServerArgs {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flat_breakout=info,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
