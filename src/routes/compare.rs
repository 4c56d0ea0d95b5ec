use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::ComparisonResult;
use crate::services::{comparison_service, ingest_service, processor};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(compare_symbols))
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    symbol1: String,
    symbol2: String,
}

#[derive(Debug, Serialize)]
struct CompareResponse {
    status: &'static str,
    comparison: ComparisonResult,
}

async fn compare_symbols(
    Query(params): Query<CompareParams>,
    State(state): State<AppState>,
) -> Result<Json<CompareResponse>, AppError> {
    info!("GET /api/compare - {} vs {}", params.symbol1, params.symbol2);

    let (symbol1, bars1) = ingest_service::get_history(
        &state.pool,
        state.bar_source.as_ref(),
        &state.config,
        &params.symbol1,
    )
    .await?;

    let (symbol2, bars2) = ingest_service::get_history(
        &state.pool,
        state.bar_source.as_ref(),
        &state.config,
        &params.symbol2,
    )
    .await?;

    let series1 = processor::derive(&bars1);
    let series2 = processor::derive(&bars2);

    let comparison = comparison_service::compare(&symbol1, &series1, &symbol2, &series2);

    Ok(Json(CompareResponse {
        status: "success",
        comparison,
    }))
}
