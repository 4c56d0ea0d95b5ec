use sqlx::SqlitePool;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::db::bar_queries;
use crate::errors::AppError;
use crate::external::bar_source::{BarSource, BarSourceError, RawBar};
use crate::models::Bar;
use crate::services::processor;

/// Bounds `days` into the serviceable [1, 365] range.
pub fn clamp_days(days: i64) -> i64 {
    days.clamp(1, 365)
}

/// Normalizes a requested symbol and rejects anything outside the
/// configured universe before any store or source access.
pub fn validate_symbol(config: &AppConfig, raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Symbol cannot be empty".to_string()));
    }
    if !config.is_known_symbol(&symbol) {
        return Err(AppError::Validation(format!(
            "Symbol '{symbol}' not found. Available symbols: {}",
            config.symbols.join(", ")
        )));
    }
    Ok(symbol)
}

/// The most recent `days` stored bars for a symbol, fetching and merging
/// from the bar source first when the store's coverage is insufficient.
pub async fn get_series(
    pool: &SqlitePool,
    source: &dyn BarSource,
    config: &AppConfig,
    raw_symbol: &str,
    days: i64,
) -> Result<(String, Vec<Bar>), AppError> {
    let symbol = validate_symbol(config, raw_symbol)?;
    let days = clamp_days(days);

    ensure_coverage(pool, source, config, &symbol).await?;

    let bars = bar_queries::fetch_window(pool, &symbol, days).await?;
    Ok((symbol, bars))
}

/// The symbol's full stored history, fetch-merging first when needed.
/// Used by the summary and comparison paths.
pub async fn get_history(
    pool: &SqlitePool,
    source: &dyn BarSource,
    config: &AppConfig,
    raw_symbol: &str,
) -> Result<(String, Vec<Bar>), AppError> {
    let symbol = validate_symbol(config, raw_symbol)?;

    ensure_coverage(pool, source, config, &symbol).await?;

    let bars = bar_queries::fetch_all(pool, &symbol).await?;
    Ok((symbol, bars))
}

/// The fetch-or-cache decision. Skips the live fetch when the store
/// already holds `sufficiency_threshold` rows for the symbol; otherwise
/// fetches the configured lookback, cleans, and merges.
///
/// A source failure is fatal only when the store holds nothing for the
/// symbol; with any cached rows it degrades to serving stale data.
/// Concurrent callers may both decide to fetch; the store's uniqueness
/// constraint turns the loser's merge into zero inserted rows.
async fn ensure_coverage(
    pool: &SqlitePool,
    source: &dyn BarSource,
    config: &AppConfig,
    symbol: &str,
) -> Result<(), AppError> {
    let cached = bar_queries::count_for_symbol(pool, symbol).await?;
    if cached >= config.sufficiency_threshold as i64 {
        return Ok(());
    }

    info!("Fetching fresh data for {symbol} (store has {cached} rows)");

    match fetch_with_retry(source, config, symbol).await {
        Ok(raw) => {
            let bars = processor::clean(symbol, raw);
            if bars.is_empty() {
                if cached == 0 {
                    return Err(AppError::DataUnavailable(format!(
                        "no valid bars returned for {symbol}"
                    )));
                }
                warn!("No valid fresh bars for {symbol}, serving {cached} cached rows");
                return Ok(());
            }

            let inserted = bar_queries::insert_new(pool, &bars).await?;
            info!("Merged {inserted} new bars for {symbol} ({} candidates)", bars.len());
            Ok(())
        }
        Err(e) if cached > 0 => {
            warn!("Bar source failed for {symbol}, serving {cached} cached rows: {e}");
            Ok(())
        }
        Err(e) => {
            error!("Bar source failed for {symbol} with an empty store: {e}");
            Err(AppError::DataUnavailable(format!("no data available for {symbol}: {e}")))
        }
    }
}

/// One bounded attempt plus a single retry before the fetch is classified
/// as a failure.
async fn fetch_with_retry(
    source: &dyn BarSource,
    config: &AppConfig,
    symbol: &str,
) -> Result<Vec<RawBar>, BarSourceError> {
    let budget = Duration::from_secs(config.fetch_timeout_secs);

    let mut last_err = BarSourceError::NoData(symbol.to_string());
    for attempt in 1..=2 {
        match timeout(budget, source.fetch_daily_bars(symbol, config.lookback_days)).await {
            Ok(Ok(bars)) => return Ok(bars),
            Ok(Err(e)) => {
                warn!("Fetch attempt {attempt} for {symbol} failed: {e}");
                last_err = e;
            }
            Err(_) => {
                warn!("Fetch attempt {attempt} for {symbol} timed out after {budget:?}");
                last_err = BarSourceError::Network(format!(
                    "timed out after {}s",
                    budget.as_secs()
                ));
            }
        }
    }

    Err(last_err)
}
