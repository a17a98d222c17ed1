//! Adapter implementations of the statistics ports.
//!
//! The user-task stores implement [`UserTaskAggregates`] directly, since the
//! aggregates read the same tables.
//!
//! [`UserTaskAggregates`]: crate::statistics::ports::UserTaskAggregates

pub mod memory;
pub mod postgres;
