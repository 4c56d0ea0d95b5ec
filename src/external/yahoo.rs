use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::external::bar_source::{BarSource, BarSourceError, RawBar};

/// Daily-bar source backed by the Yahoo Finance chart API.
///
/// NSE symbols are queried with their ".NS" suffix first; when that comes
/// back empty (some hosts block NSE data) the bare symbol is retried.
pub struct YahooBarSource {
    client: reqwest::Client,
    provider_symbols: HashMap<String, String>,
}

impl YahooBarSource {
    pub fn new(provider_symbols: HashMap<String, String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider_symbols,
        }
    }

    async fn fetch_chart(
        &self,
        provider_symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<RawBar>, BarSourceError> {
        // Yahoo supports ranges like "1mo", "6mo", "1y". Map days roughly.
        let range = if lookback_days <= 30 {
            "1mo"
        } else if lookback_days <= 180 {
            "6mo"
        } else {
            "1y"
        };

        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{provider_symbol}?range={range}&interval=1d"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BarSourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BarSourceError::BadResponse(format!(
                "status {} for {provider_symbol}",
                resp.status()
            )));
        }

        let body = resp
            .json::<ChartResponse>()
            .await
            .map_err(|e| BarSourceError::Parse(e.to_string()))?;

        let result = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| BarSourceError::BadResponse("missing chart result".into()))?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| BarSourceError::BadResponse("missing quote block".into()))?;

        // The timestamp list aligns with every quote column by index.
        let mut out = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let date = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| BarSourceError::Parse(format!("bad timestamp {ts}")))?
                .date_naive();

            out.push(RawBar {
                date,
                open: column(&quote.open, i),
                high: column(&quote.high, i),
                low: column(&quote.low, i),
                close: column(&quote.close, i),
                volume: column(&quote.volume, i),
            });
        }

        out.sort_by_key(|b| b.date);
        Ok(out)
    }
}

fn column<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

#[async_trait]
impl BarSource for YahooBarSource {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<RawBar>, BarSourceError> {
        let mapped = self
            .provider_symbols
            .get(symbol)
            .map(String::as_str)
            .unwrap_or(symbol);

        let mut bars = self.fetch_chart(mapped, lookback_days).await?;

        if bars.is_empty() && mapped != symbol {
            tracing::warn!("empty history for {mapped}, retrying bare symbol {symbol}");
            bars = self.fetch_chart(symbol, lookback_days).await?;
        }

        if bars.is_empty() {
            return Err(BarSourceError::NoData(symbol.to_string()));
        }

        Ok(bars)
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}
