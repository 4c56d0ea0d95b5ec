use chrono::NaiveDate;
use serde::Serialize;

/// A stored bar enriched with derived, order-dependent indicators.
/// Recomputed from the stored series on every query, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<i64>,
    /// (close - open) / open
    pub daily_return: f64,
    /// Mean close over the trailing 7 rows (fewer at series start).
    pub ma_7: f64,
    /// Annualized stdev of daily returns over the trailing 7 rows.
    pub volatility_score: f64,
    /// Max close over the trailing 252 rows ending here.
    pub high_52w: f64,
    /// Min close over the trailing 252 rows ending here.
    pub low_52w: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Aggregate view over a full processed series, computed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub high_52w: f64,
    pub low_52w: f64,
    pub avg_close: f64,
    pub current_close: f64,
    pub total_records: usize,
    pub date_range: DateRange,
}
