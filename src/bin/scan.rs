//! One-shot detection: print the flat-breakout response for a ticker and day

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use flat_breakout::{
    config::{init_tracing, ProviderArgs},
    runner::{parse_trade_date, PatternRunner},
};

#[derive(Parser, Debug)]
#[command(name = "scan")]
#[command(about = "Run Flat-Top / Flat-Bottom detection once and print JSON")]
struct Args {
    /// Ticker symbol, e.g. SBER
    #[arg(short, long)]
    ticker: String,

    /// Instrument UID in the Tinkoff Invest API
    #[arg(short, long)]
    uid: String,

    /// Trade date (YYYY-MM-DD, UTC); defaults to today
    #[arg(short, long)]
    date: Option<String>,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let date = match args.date.as_deref() {
        Some(raw) => parse_trade_date(raw)?,
        None => Utc::now().date_naive(),
    };

    let runner = PatternRunner::new(args.provider.build_provider()?, args.provider.runner_config());
    let response = runner
        .detect(&args.ticker, &args.uid, date)
        .await
        .with_context(|| format!("Detection failed for {} on {}", args.ticker, date))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
