use crate::external::bar_source::RawBar;
use crate::models::{Bar, DateRange, ProcessedBar, SeriesSummary};

/// Trailing window for the moving average of closes.
pub const MA_WINDOW: usize = 7;
/// Trailing window for the volatility score, kept consistent with `ma_7`.
pub const VOLATILITY_WINDOW: usize = 7;
/// Trading days in a year; also the 52-week trailing window length.
/// A symbol with fewer stored rows computes its 52-week extrema over what
/// exists, a known approximation for thin histories.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Cleans a raw provider series into storable bars.
///
/// In order: rows with every price field missing are dropped; isolated
/// missing price fields are forward-filled from the last seen value (a gap
/// at the very first row stays missing and the row is dropped); rows with
/// any non-positive price are dropped; finally the series is re-sorted by
/// date and de-duplicated, since merged fresh/cached input must not be
/// assumed pre-sorted.
pub fn clean(symbol: &str, raw: Vec<RawBar>) -> Vec<Bar> {
    let mut last_open = None;
    let mut last_high = None;
    let mut last_low = None;
    let mut last_close = None;

    let mut bars: Vec<Bar> = Vec::with_capacity(raw.len());

    for row in raw {
        if row.open.is_none() && row.high.is_none() && row.low.is_none() && row.close.is_none() {
            continue;
        }

        let open = row.open.or(last_open);
        let high = row.high.or(last_high);
        let low = row.low.or(last_low);
        let close = row.close.or(last_close);

        let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
            continue;
        };

        last_open = Some(open);
        last_high = Some(high);
        last_low = Some(low);
        last_close = Some(close);

        let bar = Bar {
            symbol: symbol.to_string(),
            date: row.date,
            open,
            high,
            low,
            close,
            volume: row.volume,
        };

        if bar.is_valid() {
            bars.push(bar);
        }
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

/// Derives per-row indicators over a cleaned, ascending series.
/// A series shorter than any window computes over the rows available.
pub fn derive(bars: &[Bar]) -> Vec<ProcessedBar> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let returns: Vec<f64> = bars.iter().map(|b| (b.close - b.open) / b.open).collect();

    let ma = rolling_mean(&closes, MA_WINDOW);
    let vol = rolling_std(&returns, VOLATILITY_WINDOW);
    let highs = rolling_max(&closes, TRADING_DAYS_PER_YEAR);
    let lows = rolling_min(&closes, TRADING_DAYS_PER_YEAR);

    let annualize = (TRADING_DAYS_PER_YEAR as f64).sqrt();

    bars.iter()
        .enumerate()
        .map(|(i, b)| ProcessedBar {
            date: b.date,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
            daily_return: returns[i],
            ma_7: ma[i],
            volatility_score: vol[i] * annualize,
            high_52w: highs[i],
            low_52w: lows[i],
        })
        .collect()
}

/// Aggregate summary over a full processed series. `None` only for an
/// empty series.
pub fn summarize(series: &[ProcessedBar]) -> Option<SeriesSummary> {
    let first = series.first()?;
    let last = series.last()?;
    let avg_close = series.iter().map(|p| p.close).sum::<f64>() / series.len() as f64;

    Some(SeriesSummary {
        high_52w: last.high_52w,
        low_52w: last.low_52w,
        avg_close,
        current_close: last.close,
        total_records: series.len(),
        date_range: DateRange {
            start: first.date,
            end: last.date,
        },
    })
}

/// Trailing mean over at most `window` values ending at each index.
/// Partial windows at the series start use the rows available, so the
/// output is defined for every input row.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    trailing_windows(values, window)
        .map(|w| w.iter().sum::<f64>() / w.len() as f64)
        .collect()
}

/// Trailing sample standard deviation (n - 1 denominator) over at most
/// `window` values; windows with fewer than 2 samples report 0.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    trailing_windows(values, window).map(sample_std).collect()
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    trailing_windows(values, window)
        .map(|w| w.iter().copied().fold(f64::MIN, f64::max))
        .collect()
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    trailing_windows(values, window)
        .map(|w| w.iter().copied().fold(f64::MAX, f64::min))
        .collect()
}

fn trailing_windows(values: &[f64], window: usize) -> impl Iterator<Item = &[f64]> {
    (0..values.len()).map(move |i| &values[(i + 1).saturating_sub(window.max(1))..=i])
}

/// Sample standard deviation (n - 1 denominator); 0 below 2 samples.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn raw(day: u32, open: Option<f64>, close: Option<f64>) -> RawBar {
        RawBar {
            date: date(day),
            open,
            high: close.map(|c| c + 1.0),
            low: open.map(|o| o - 1.0),
            close,
            volume: Some(1000),
        }
    }

    fn bar(day: u32, open: f64, close: f64) -> Bar {
        Bar {
            symbol: "TCS".to_string(),
            date: date(day),
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
            volume: Some(1000),
        }
    }

    #[test]
    fn daily_return_formula() {
        let processed = derive(&[bar(1, 100.0, 102.0)]);
        assert_eq!(processed[0].daily_return, 0.02);
    }

    #[test]
    fn ma_7_uses_partial_windows_at_start() {
        let bars = vec![bar(1, 10.0, 10.0), bar(2, 20.0, 20.0), bar(3, 30.0, 30.0)];
        let processed = derive(&bars);
        let ma: Vec<f64> = processed.iter().map(|p| p.ma_7).collect();
        assert_eq!(ma, vec![10.0, 15.0, 20.0]);
    }

    #[test]
    fn volatility_is_never_negative() {
        let bars: Vec<Bar> = (1..=20)
            .map(|d| bar(d, 100.0 + d as f64, 100.0 + (d as f64 * 1.7) % 9.0))
            .collect();
        for p in derive(&bars) {
            assert!(p.volatility_score >= 0.0);
        }
    }

    #[test]
    fn volatility_is_zero_for_single_sample() {
        let processed = derive(&[bar(1, 100.0, 105.0)]);
        assert_eq!(processed[0].volatility_score, 0.0);
    }

    #[test]
    fn trailing_extrema_track_closes() {
        let bars = vec![bar(1, 10.0, 12.0), bar(2, 12.0, 8.0), bar(3, 8.0, 15.0)];
        let processed = derive(&bars);
        assert_eq!(processed[2].high_52w, 15.0);
        assert_eq!(processed[2].low_52w, 8.0);
        assert_eq!(processed[1].high_52w, 12.0);
        assert_eq!(processed[1].low_52w, 8.0);
    }

    #[test]
    fn derive_of_empty_series_is_empty() {
        assert!(derive(&[]).is_empty());
    }

    #[test]
    fn clean_drops_rows_with_all_prices_missing() {
        let rows = vec![raw(1, Some(10.0), Some(11.0)), raw(2, None, None)];
        let bars = clean("TCS", rows);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(1));
    }

    #[test]
    fn clean_forward_fills_isolated_gaps() {
        let rows = vec![raw(1, Some(10.0), Some(11.0)), raw(2, None, Some(12.0))];
        let bars = clean("TCS", rows);
        assert_eq!(bars.len(), 2);
        // open carried forward from the previous row
        assert_eq!(bars[1].open, 10.0);
        assert_eq!(bars[1].close, 12.0);
    }

    #[test]
    fn clean_drops_first_row_with_unfillable_gap() {
        let rows = vec![raw(1, None, Some(11.0)), raw(2, Some(12.0), Some(13.0))];
        let bars = clean("TCS", rows);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2));
    }

    #[test]
    fn clean_drops_non_positive_prices() {
        let rows = vec![raw(1, Some(10.0), Some(-1.0)), raw(2, Some(10.0), Some(11.0))];
        let bars = clean("TCS", rows);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2));
    }

    #[test]
    fn clean_sorts_and_dedups_by_date() {
        let rows = vec![
            raw(3, Some(30.0), Some(31.0)),
            raw(1, Some(10.0), Some(11.0)),
            raw(3, Some(99.0), Some(98.0)),
            raw(2, Some(20.0), Some(21.0)),
        ];
        let bars = clean("TCS", rows);
        let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![date(1), date(2), date(3)]);
    }

    #[test]
    fn summarize_reports_aggregates_and_range() {
        let bars = vec![bar(1, 10.0, 12.0), bar(2, 12.0, 8.0), bar(3, 8.0, 16.0)];
        let summary = summarize(&derive(&bars)).unwrap();
        assert_eq!(summary.high_52w, 16.0);
        assert_eq!(summary.low_52w, 8.0);
        assert_eq!(summary.avg_close, 12.0);
        assert_eq!(summary.current_close, 16.0);
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.date_range.start, date(1));
        assert_eq!(summary.date_range.end, date(3));
    }

    #[test]
    fn summarize_of_empty_series_is_none() {
        assert!(summarize(&[]).is_none());
    }
}
