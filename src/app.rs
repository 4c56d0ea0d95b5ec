use axum::http::HeaderValue;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::AppConfig;
use crate::routes::{compare, health, series, summary, symbols};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .route("/", get(root))
        .nest("/health", health::router())
        .nest("/api/symbols", symbols::router())
        .nest("/api/data", series::router())
        .nest("/api/summary", summary::router())
        .nest("/api/compare", compare::router())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_allow_all {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Stock Data Intelligence Dashboard API",
        "endpoints": {
            "symbols": "/api/symbols",
            "stock_data": "/api/data/{symbol}",
            "summary": "/api/summary/{symbol}",
            "compare": "/api/compare?symbol1=TCS&symbol2=INFY"
        }
    }))
}
