use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;

use stockdash_backend::app;
use stockdash_backend::config::AppConfig;
use stockdash_backend::external::bar_source::BarSource;
use stockdash_backend::external::mock::MockBarSource;
use stockdash_backend::external::yahoo::YahooBarSource;
use stockdash_backend::logging::{init_logging, LoggingConfig};
use stockdash_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env());

    let config = AppConfig::from_env();

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    // Select bar source based on BAR_SOURCE env var (defaults to yahoo)
    let source_name = std::env::var("BAR_SOURCE").unwrap_or_else(|_| "yahoo".to_string());
    let bar_source: Arc<dyn BarSource> = match source_name.to_lowercase().as_str() {
        "mock" => {
            tracing::info!("📊 Using bar source: mock random walk");
            Arc::new(MockBarSource::new())
        }
        "yahoo" => {
            tracing::info!("📊 Using bar source: Yahoo Finance");
            Arc::new(YahooBarSource::new(config.provider_symbols.clone()))
        }
        other => {
            anyhow::bail!("Invalid BAR_SOURCE: {other}. Must be 'yahoo' or 'mock'");
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        pool,
        bar_source,
        config: Arc::new(config),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Stock data backend running at http://{addr}/");
    axum::serve(listener, app).await?;

    Ok(())
}
