//! Port contracts for the user-task lifecycle.
//!
//! Ports define infrastructure-agnostic interfaces used by lifecycle services.

pub mod repository;
pub mod reviewer;

pub use repository::{
    RepositoryError, RepositoryResult, StaffRepository, TaskRepository, TaskUpdate,
    TransitionCommit, UserTaskRepository, UserTaskWrite,
};
pub use reviewer::ReviewerPicker;
