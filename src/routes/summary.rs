use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::SeriesSummary;
use crate::services::{ingest_service, processor};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol", get(get_summary))
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    status: &'static str,
    symbol: String,
    summary: SeriesSummary,
}

async fn get_summary(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, AppError> {
    info!("GET /api/summary/{symbol}");

    let (symbol, bars) = ingest_service::get_history(
        &state.pool,
        state.bar_source.as_ref(),
        &state.config,
        &symbol,
    )
    .await?;

    let processed = processor::derive(&bars);
    let summary = processor::summarize(&processed)
        .ok_or_else(|| AppError::DataUnavailable(format!("no data available for {symbol}")))?;

    Ok(Json(SummaryResponse {
        status: "success",
        symbol,
        summary,
    }))
}
