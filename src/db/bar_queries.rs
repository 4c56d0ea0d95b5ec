use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::error;

use crate::models::Bar;

/// Fetch bars for a symbol, optionally bounded by [start, end], ascending
/// by date. An empty result is a valid answer, not an error.
pub async fn fetch_range(
    pool: &SqlitePool,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Bar>, sqlx::Error> {
    sqlx::query_as::<_, Bar>(
        r#"
        SELECT symbol, date, open, high, low, close, volume
        FROM bars
        WHERE symbol = ?
          AND (? IS NULL OR date >= ?)
          AND (? IS NULL OR date <= ?)
        ORDER BY date ASC
        "#,
    )
    .bind(symbol)
    .bind(start)
    .bind(start)
    .bind(end)
    .bind(end)
    .fetch_all(pool)
    .await
}

pub async fn fetch_all(pool: &SqlitePool, symbol: &str) -> Result<Vec<Bar>, sqlx::Error> {
    fetch_range(pool, symbol, None, None).await
}

/// Fetch the most recent `days` bars for a symbol, returned ascending
/// (oldest first).
pub async fn fetch_window(
    pool: &SqlitePool,
    symbol: &str,
    days: i64,
) -> Result<Vec<Bar>, sqlx::Error> {
    sqlx::query_as::<_, Bar>(
        r#"
        SELECT symbol, date, open, high, low, close, volume
        FROM bars
        WHERE symbol = ?
        ORDER BY date DESC
        LIMIT ?
        "#,
    )
    .bind(symbol)
    .bind(days)
    .fetch_all(pool)
    .await
    .map(|mut bars| {
        bars.reverse();
        bars
    })
}

pub async fn count_for_symbol(pool: &SqlitePool, symbol: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bars WHERE symbol = ?")
        .bind(symbol)
        .fetch_one(pool)
        .await
}

/// Insert candidate bars, silently skipping any (symbol, date) that already
/// exists. Returns the number of rows actually inserted.
///
/// ON CONFLICT DO NOTHING makes the table's primary key the final arbiter
/// under concurrent overlapping inserts: the losing writer simply counts
/// zero additional rows.
pub async fn insert_new(pool: &SqlitePool, bars: &[Bar]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for bar in bars {
        let result = sqlx::query(
            r#"
            INSERT INTO bars (symbol, date, open, high, low, close, volume)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (symbol, date) DO NOTHING
            "#,
        )
        .bind(&bar.symbol)
        .bind(bar.date)
        .bind(bar.open)
        .bind(bar.high)
        .bind(bar.low)
        .bind(bar.close)
        .bind(bar.volume)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                "Failed to insert bar for {} on {}: {}",
                bar.symbol, bar.date, e
            );
            e
        })?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}
