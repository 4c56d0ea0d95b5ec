use async_trait::async_trait;
use chrono::{Datelike, Duration, Utc};

use crate::external::bar_source::{BarSource, BarSourceError, RawBar};

/// Random-walk bar source for offline development (`BAR_SOURCE=mock`).
/// Weekends are skipped so the series looks like trading days.
pub struct MockBarSource;

impl MockBarSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockBarSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BarSource for MockBarSource {
    async fn fetch_daily_bars(
        &self,
        _symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<RawBar>, BarSourceError> {
        let today = Utc::now().date_naive();
        let mut close = 100.0_f64;
        let mut out = Vec::new();

        for offset in (0..lookback_days as i64).rev() {
            let date = today - Duration::days(offset);
            if matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
                continue;
            }

            let open = close;
            close = open * (1.0 + (rand::random::<f64>() - 0.5) * 0.02);
            let high = open.max(close) * (1.0 + rand::random::<f64>() * 0.005);
            let low = open.min(close) * (1.0 - rand::random::<f64>() * 0.005);

            out.push(RawBar {
                date,
                open: Some(open),
                high: Some(high),
                low: Some(low),
                close: Some(close),
                volume: Some(1_000_000 + (rand::random::<f64>() * 500_000.0) as i64),
            });
        }

        Ok(out)
    }
}
