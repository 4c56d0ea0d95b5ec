use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{ComparisonInsights, ComparisonResult, PerformanceMetrics, ProcessedBar};
use crate::services::processor;

/// Compares two processed series: date-aligned Pearson correlation of
/// closes, per-symbol performance over each full series, and qualitative
/// insights. Degraded input never fails; affected metrics resolve to
/// neutral values with an advisory note.
pub fn compare(
    symbol1: &str,
    series1: &[ProcessedBar],
    symbol2: &str,
    series2: &[ProcessedBar],
) -> ComparisonResult {
    let (x, y) = align_closes(series1, series2);

    let (correlation, note) = if x.len() < 2 {
        (
            0.0,
            Some(format!(
                "Only {} overlapping trading days between {symbol1} and {symbol2}; correlation reported as 0.0",
                x.len()
            )),
        )
    } else {
        match pearson(&x, &y) {
            Some(r) => (r.clamp(-1.0, 1.0), None),
            None => (
                0.0,
                Some(
                    "Closing prices show no variance over the overlapping window; correlation reported as 0.0"
                        .to_string(),
                ),
            ),
        }
    };

    let metrics1 = performance_metrics(series1);
    let metrics2 = performance_metrics(series2);

    // Ties resolve to symbol1.
    let better_performer = if metrics1.total_return_pct >= metrics2.total_return_pct {
        symbol1.to_string()
    } else {
        symbol2.to_string()
    };

    let insights = ComparisonInsights {
        better_performer,
        return_difference: round_to((metrics1.total_return_pct - metrics2.total_return_pct).abs(), 2),
        correlation_interpretation: interpret_correlation(correlation).to_string(),
    };

    ComparisonResult {
        symbol1: symbol1.to_string(),
        symbol2: symbol2.to_string(),
        correlation: round_to(correlation, 4),
        symbol1_metrics: metrics1,
        symbol2_metrics: metrics2,
        insights,
        note,
    }
}

/// Performance over a symbol's own full series (not the aligned subset).
/// An empty series reports zeros rather than failing.
pub fn performance_metrics(series: &[ProcessedBar]) -> PerformanceMetrics {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return PerformanceMetrics {
            total_return_pct: 0.0,
            avg_daily_return: 0.0,
            volatility: 0.0,
            high_52w: 0.0,
            low_52w: 0.0,
            avg_close: 0.0,
        };
    };

    let total_return_pct = if first.close > 0.0 {
        (last.close - first.close) / first.close * 100.0
    } else {
        0.0
    };

    let returns: Vec<f64> = series.iter().map(|p| p.daily_return).collect();
    let avg_daily_return = returns.iter().sum::<f64>() / returns.len() as f64;
    let avg_close = series.iter().map(|p| p.close).sum::<f64>() / series.len() as f64;

    PerformanceMetrics {
        total_return_pct: round_to(total_return_pct, 2),
        avg_daily_return: round_to(avg_daily_return, 4),
        volatility: round_to(processor::sample_std(&returns), 4),
        // the last row's trailing extrema are the series' 52-week values
        high_52w: last.high_52w,
        low_52w: last.low_52w,
        avg_close,
    }
}

/// Inner join on date: closes for dates present in both series, in
/// series1's ascending order.
fn align_closes(series1: &[ProcessedBar], series2: &[ProcessedBar]) -> (Vec<f64>, Vec<f64>) {
    let by_date: HashMap<NaiveDate, f64> = series2.iter().map(|p| (p.date, p.close)).collect();

    series1
        .iter()
        .filter_map(|p| by_date.get(&p.date).map(|&c| (p.close, c)))
        .unzip()
}

/// Pearson correlation coefficient. `None` when either side has zero
/// variance, where the coefficient is undefined.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;

    let (sx, sy, sxy, sx2, sy2) = x.iter().zip(y).fold(
        (0.0, 0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sx2, sy2), (&a, &b)| {
            (sx + a, sy + b, sxy + a * b, sx2 + a * a, sy2 + b * b)
        },
    );

    let denom = ((n * sx2 - sx * sx) * (n * sy2 - sy * sy)).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    Some((n * sxy - sx * sy) / denom)
}

fn interpret_correlation(r: f64) -> &'static str {
    if r > 0.7 {
        "Strong positive"
    } else if r > 0.3 {
        "Moderate positive"
    } else if r > -0.3 {
        "Weak"
    } else {
        "Negative"
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
