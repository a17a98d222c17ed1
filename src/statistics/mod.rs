//! Marketplace statistics.
//!
//! Aggregates user-task activity per task/app pair and per reviewer over a
//! time window, and keeps collected figures as snapshots for later listing.
//! Aggregate rows that do not have the expected shape are skipped and logged
//! rather than failing the batch.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
