use anyhow::{Context, Result};
use clap::Parser;
use flat_breakout::{
    api,
    config::{init_tracing, ProviderArgs, ServerArgs},
    runner::PatternRunner,
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flat-Top / Flat-Bottom breakout detection service")]
struct Args {
    #[command(flatten)]
    server: ServerArgs,

    #[command(flatten)]
    provider: ProviderArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();

    info!("Starting Flat-Breakout server");
    info!("Port: {}", args.server.port);
    match &args.provider.csv_dir {
        Some(dir) => info!("Candle source: CSV files in {}", dir.display()),
        None => info!("Candle source: {}", args.provider.base_url),
    }

    let provider = args.provider.build_provider()?;
    let state = Arc::new(AppState {
        runner: PatternRunner::new(provider, args.provider.runner_config()),
        request_timeout: args.server.request_timeout(),
    });

    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", args.server.host, args.server.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", args.server.host, args.server.port))?;
    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
