use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_symbols))
}

#[derive(Debug, Serialize)]
struct SymbolsResponse {
    status: &'static str,
    count: usize,
    symbols: Vec<String>,
}

async fn list_symbols(State(state): State<AppState>) -> Json<SymbolsResponse> {
    info!("GET /api/symbols - Listing symbol universe");
    let symbols = state.config.symbols.clone();
    Json(SymbolsResponse {
        status: "success",
        count: symbols.len(),
        symbols,
    })
}
