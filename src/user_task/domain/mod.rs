//! Domain model for the user-task lifecycle.
//!
//! Entities here are plain structs with private fields and explicit
//! transition methods; nothing in this module touches storage.

mod error;
mod ids;
mod log;
mod staff;
mod task;
pub mod time;
mod user_task;

pub use error::{ParseStaffError, ParseUserTaskStatusError, UserTaskDomainError};
pub use ids::{AppId, AppUserId, StaffUserId, TaskId, UserTaskId, UserTaskLogId};
pub use log::{LedgerReconciliation, Operator, PersistedUserTaskLogData, UserTaskLog};
pub use staff::{StaffRole, StaffStatus, StaffUser};
pub use task::{PersistedTaskData, Task, TaskLimits};
pub use user_task::{PersistedUserTaskData, UserTask, UserTaskStatus};
