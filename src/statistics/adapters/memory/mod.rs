//! In-memory statistics adapters.

mod aggregates;
mod repository;

pub use repository::InMemoryStatisticsRepository;
