//! User-task lifecycle for the task marketplace.
//!
//! End users reach tasks through app channels. They receive an instance of a
//! task, complete it, and a staff reviewer accepts or rejects the work. Each
//! step moves a counter on the task and appends an audit record in the same
//! commit. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;
