use serde::Serialize;

/// Per-symbol performance over its full processed series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_return_pct: f64,
    pub avg_daily_return: f64,
    pub volatility: f64,
    pub high_52w: f64,
    pub low_52w: f64,
    pub avg_close: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonInsights {
    pub better_performer: String,
    pub return_difference: f64,
    pub correlation_interpretation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub symbol1: String,
    pub symbol2: String,
    pub correlation: f64,
    pub symbol1_metrics: PerformanceMetrics,
    pub symbol2_metrics: PerformanceMetrics,
    pub insights: ComparisonInsights,
    /// Advisory note attached when correlation degraded to 0.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
