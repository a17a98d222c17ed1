//! Taskmarket: task marketplace lifecycle and statistics.
//!
//! Task campaigns publish a fixed number of slots. End users reach the
//! marketplace through app channels, receive an instance of a task, complete
//! it, and have it reviewed by staff. Every transition moves the campaign's
//! counters atomically with an audit record, and activity is rolled up into
//! per-window statistics.
//!
//! # Architecture
//!
//! Taskmarket follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory and `PostgreSQL`)
//!
//! # Modules
//!
//! - [`config`]: Layered runtime configuration
//! - [`user_task`]: Receive, complete, and review lifecycle with audit trail
//! - [`statistics`]: Windowed aggregation of marketplace activity

pub mod config;
pub mod statistics;
pub mod user_task;
