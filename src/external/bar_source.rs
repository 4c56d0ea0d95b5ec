use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// An OHLCV row as the provider reports it. Price fields may be missing;
/// the cleaning pipeline decides what survives.
#[derive(Debug, Clone)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

#[derive(Debug, Error)]
pub enum BarSourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no data returned for {0}")]
    NoData(String),
}

#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch up to `lookback_days` of daily bars for a dashboard symbol,
    /// ascending by date. An empty history is reported as `NoData`.
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<RawBar>, BarSourceError>;
}
