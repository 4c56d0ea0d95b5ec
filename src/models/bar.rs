use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// One trading day of OHLCV data for one symbol.
// Identity is the (symbol, date) pair; rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
}

impl Bar {
    /// Prices must be strictly positive for a bar to be storable.
    pub fn is_valid(&self) -> bool {
        self.open > 0.0 && self.high > 0.0 && self.low > 0.0 && self.close > 0.0
    }
}
