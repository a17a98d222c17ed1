//! `PostgreSQL` statistics adapters.

mod aggregates;
mod models;
mod repository;
mod schema;

pub use repository::PostgresStatisticsRepository;
