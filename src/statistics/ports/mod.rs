//! Port contracts for statistics.

mod aggregates;
mod repository;

pub use aggregates::UserTaskAggregates;
pub use repository::{StatisticsRepository, TaskAppStatisticsFilter};
