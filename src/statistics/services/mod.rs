//! Application services for statistics.

mod statistics;

pub use statistics::{StatisticsError, StatisticsResult, StatisticsService};
