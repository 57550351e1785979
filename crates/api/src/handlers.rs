use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use jetbuddy_market::canonical_symbol;
use jetbuddy_control::parse_recipient;
use jetbuddy_models::{AnalysisOutput, EngineError, ErrorShape, WatchlistAddItem, WatchlistItem};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

type ApiError = (StatusCode, Json<ErrorShape>);

const UNEXPECTED: &str = "An unexpected error occurred.";

fn error_response(e: EngineError) -> ApiError {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let shape = match e {
        EngineError::SqlxError(_)
        | EngineError::SerdeError(_)
        | EngineError::DatabaseError { .. }
        | EngineError::InternalError { .. } => {
            error!("Unexpected error: {}", e);
            ErrorShape {
                detail: UNEXPECTED.to_string(),
            }
        }
        _ => e.to_error_shape(),
    };
    (status, Json(shape))
}

fn bad_request(reason: &str) -> ApiError {
    error_response(EngineError::InvalidRequest {
        reason: reason.to_string(),
    })
}

pub async fn root() -> Json<Value> {
    Json(json!({ "status": "Jet Buddy is running!" }))
}

/// Cached signal, or a background run with 202 when none exists yet.
#[instrument(skip(state))]
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<AnalysisOutput>, ApiError> {
    let symbol = canonical_symbol(&symbol);

    match state.store.get_cached_analysis(&symbol).await.map_err(error_response)? {
        Some(output) if output.is_error() => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorShape {
                detail: output.error_message.unwrap_or_else(|| UNEXPECTED.to_string()),
            }),
        )),
        Some(output) => Ok(Json(output)),
        None => {
            let pipeline = state.pipeline.clone();
            let background = symbol.clone();
            tokio::spawn(async move {
                if let Err(e) = pipeline.run(&background).await {
                    error!(symbol = %background, error = %e, "Background analysis failed");
                }
            });
            info!("Analysis for {} scheduled in the background", symbol);
            Err(error_response(EngineError::AnalysisPending { symbol }))
        }
    }
}

#[instrument(skip(state))]
pub async fn force_run_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<AnalysisOutput>, ApiError> {
    state.pipeline.run(&symbol).await.map(Json).map_err(error_response)
}

#[instrument(skip(state))]
pub async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(item): Json<WatchlistAddItem>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let symbol = item
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("Symbol is required."))?;
    let email = item.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email {
        if parse_recipient(email).is_none() {
            return Err(bad_request("Invalid email address."));
        }
    }

    let normalized = canonical_symbol(symbol);
    state
        .store
        .add_to_watchlist(symbol, &normalized, email)
        .await
        .map_err(error_response)?;

    state.pipeline.run(&normalized).await.map_err(error_response)?;

    let mut message = format!("'{}' (as '{}') added to watchlist. Analysis triggered.", symbol, normalized);
    if let Some(email) = email {
        message.push_str(&format!(" Signal will be sent to {}.", email));
    }
    Ok((StatusCode::CREATED, Json(json!({ "message": message }))))
}

pub async fn list_watchlist(State(state): State<AppState>) -> Result<Json<Vec<WatchlistItem>>, ApiError> {
    state.store.full_watchlist().await.map(Json).map_err(error_response)
}

#[instrument(skip(state))]
pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if state.store.remove_from_watchlist(id).await.map_err(error_response)? {
        Ok(Json(json!({ "message": format!("Item {} removed from watchlist.", id) })))
    } else {
        Err(error_response(EngineError::WatchlistItemNotFound { id }))
    }
}

#[instrument(skip(state))]
pub async fn get_market_data(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let symbol = canonical_symbol(&symbol);
    match state.pipeline.feed().fetch(&symbol).await {
        Some(data) => Ok(Json(json!({
            "symbol": symbol,
            "source": data.source,
            "data": data.candles,
        }))),
        None => Err(error_response(EngineError::MarketDataUnavailable { symbol })),
    }
}

#[instrument(skip(state))]
pub async fn get_sentiment(State(state): State<AppState>, Path(symbol): Path<String>) -> Json<Value> {
    let symbol = canonical_symbol(&symbol);
    let summary = state.pipeline.sentiment().analyze(&symbol).await;
    Json(json!({
        "symbol": symbol,
        "dominant_sentiment": summary.sentiment,
        "confidence": summary.confidence,
        "source": "Newsdata.io with LLM/Keyword analysis",
    }))
}

pub async fn check_cache(State(state): State<AppState>) -> Json<Value> {
    match state.store.check_cache().await {
        Ok(()) => Json(json!({ "status": "ok", "message": "Cache initialized successfully." })),
        Err(e) => Json(json!({ "status": "error", "message": e.to_string() })),
    }
}

#[instrument(skip(state))]
pub async fn metrics(State(state): State<AppState>) -> Result<String, StatusCode> {
    match state.metrics.get_prometheus_metrics() {
        Ok(metrics) => Ok(metrics),
        Err(e) => {
            error!("Failed to get metrics: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
