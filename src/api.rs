use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::errors::{DetectError, DetectResult};
use crate::runner::parse_trade_date;
use crate::types::{AppState, CombinedResponse};

/// Query params for the flat-breakout endpoint
#[derive(Debug, Deserialize)]
pub struct FlatBreakoutQueryParams {
    pub ticker: String,
    pub uid: String,
    /// YYYY-MM-DD (UTC); today when omitted
    pub date: Option<String>,
}

/// Build the HTTP router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/flat-breakout", get(get_flat_breakout))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// GET /flat-breakout - Flat-Top / Flat-Bottom patterns for one ticker and day
pub async fn get_flat_breakout(
    State(state): State<Arc<AppState>>,
    params: Result<Query<FlatBreakoutQueryParams>, QueryRejection>,
) -> impl IntoResponse {
    let result = match params {
        Ok(Query(params)) => {
            info!(
                "flat-breakout request ticker={} uid={} date={:?}",
                params.ticker, params.uid, params.date
            );
            run_detection(&state, &params).await
        }
        Err(rejection) => Err(DetectError::InvalidRequest(rejection.body_text())),
    };

    match result {
        Ok(response) => (StatusCode::OK, Json(serde_json::json!(response))),
        Err(e) => {
            warn!("flat-breakout request failed: {}", e);
            (status_for(&e), Json(serde_json::json!({"error": e.to_string()})))
        }
    }
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn run_detection(
    state: &AppState,
    params: &FlatBreakoutQueryParams,
) -> DetectResult<CombinedResponse> {
    let date = match params.date.as_deref() {
        Some(raw) => parse_trade_date(raw)?,
        None => Utc::now().date_naive(),
    };

    tokio::time::timeout(
        state.request_timeout,
        state.runner.detect(&params.ticker, &params.uid, date),
    )
    .await
    .map_err(|_| DetectError::Timeout(state.request_timeout))?
}

fn status_for(error: &DetectError) -> StatusCode {
    if error.is_client_error() {
        return StatusCode::BAD_REQUEST;
    }
    match error {
        DetectError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
