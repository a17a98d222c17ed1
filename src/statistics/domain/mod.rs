//! Statistics domain values.

mod aggregate;
mod records;
mod window;

pub use aggregate::{AggregateRow, AggregateValue};
pub use records::{ReviewerTaskStatistics, TaskAppStatistics};
pub use window::{InvalidWindow, StatisticsWindow};
