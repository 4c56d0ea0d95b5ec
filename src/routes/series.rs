use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::ProcessedBar;
use crate::services::{ingest_service, processor};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol", get(get_series))
}

#[derive(Debug, Deserialize)]
struct SeriesParams {
    #[serde(default = "default_days")]
    days: i64,
}

fn default_days() -> i64 {
    30
}

#[derive(Debug, Serialize)]
struct SeriesResponse {
    status: &'static str,
    symbol: String,
    days: usize,
    bars: Vec<ProcessedBar>,
}

async fn get_series(
    Path(symbol): Path<String>,
    Query(params): Query<SeriesParams>,
    State(state): State<AppState>,
) -> Result<Json<SeriesResponse>, AppError> {
    info!("GET /api/data/{symbol} - days={}", params.days);

    let (symbol, bars) = ingest_service::get_series(
        &state.pool,
        state.bar_source.as_ref(),
        &state.config,
        &symbol,
        params.days,
    )
    .await?;

    let bars = processor::derive(&bars);

    Ok(Json(SeriesResponse {
        status: "success",
        symbol,
        days: bars.len(),
        bars,
    }))
}
