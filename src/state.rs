use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::external::bar_source::BarSource;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub bar_source: Arc<dyn BarSource>,
    pub config: Arc<AppConfig>,
}
