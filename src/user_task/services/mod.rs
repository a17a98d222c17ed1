//! Application services for the user-task lifecycle.

mod audit;
mod lifecycle;

pub use audit::AuditTrailService;
pub use lifecycle::{UserTaskLifecycleError, UserTaskLifecycleResult, UserTaskLifecycleService};
