mod bar;
mod comparison;
mod processed_bar;

pub use bar::Bar;
pub use comparison::{ComparisonInsights, ComparisonResult, PerformanceMetrics};
pub use processed_bar::{DateRange, ProcessedBar, SeriesSummary};
