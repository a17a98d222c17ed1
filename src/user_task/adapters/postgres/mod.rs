//! `PostgreSQL` adapters for lifecycle persistence.

pub(crate) mod models;
mod repository;
pub(crate) mod schema;

pub(crate) use repository::run_blocking;
pub use repository::{MarketPgPool, PostgresStaffRepository, PostgresUserTaskStore, build_pool};
