//! Error types for user-task eligibility, transitions, and parsing.

use super::{TaskId, UserTaskStatus};
use thiserror::Error;

/// Errors raised by user-task domain rules.
///
/// The first three variants are eligibility failures a caller can report back
/// to the end user. The rest indicate a caller or programming error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserTaskDomainError {
    /// The end user already holds the per-person maximum of this task.
    #[error("per-person receive limit of {limit} reached")]
    LimitExceeded {
        /// Configured per-person limit.
        limit: u32,
    },

    /// The end user received this task too recently.
    #[error("task was received {elapsed_days} day(s) ago; cooldown is {recycle_days} day(s)")]
    CooldownActive {
        /// Configured cooldown in whole days.
        recycle_days: u32,
        /// Whole days since the previous receive.
        elapsed_days: i64,
    },

    /// The task has no receivable slots left.
    #[error("task {0} has no remaining capacity")]
    CapacityExhausted(TaskId),

    /// The requested status transition is not allowed.
    #[error("invalid user task transition from {from} to {to}")]
    InvalidTransition {
        /// Status the user task is in (or claimed to be in).
        from: UserTaskStatus,
        /// Requested target status.
        to: UserTaskStatus,
    },

    /// The user task does not belong to the supplied task.
    #[error("user task belongs to task {actual}, not {expected}")]
    TaskMismatch {
        /// Task the operation was invoked with.
        expected: TaskId,
        /// Task the user task references.
        actual: TaskId,
    },

    /// A task counter would overflow.
    #[error("counter overflow on task {0}")]
    CounterOverflow(TaskId),

    /// The app channel identifier is invalid.
    #[error("invalid app id {0}, expected a positive integer")]
    InvalidAppId(u64),

    /// The end-user identifier is empty after trimming.
    #[error("app user id must not be empty")]
    EmptyAppUserId,

    /// The task capacity is inconsistent (more left than total).
    #[error("left amount {left} exceeds total amount {total}")]
    InvalidCapacity {
        /// Total slots.
        total: u64,
        /// Remaining slots.
        left: u64,
    },
}

impl UserTaskDomainError {
    /// Returns `true` for eligibility failures that leave no state behind
    /// and can be reported to the end user.
    #[must_use]
    pub const fn is_eligibility_failure(&self) -> bool {
        matches!(
            self,
            Self::LimitExceeded { .. } | Self::CooldownActive { .. } | Self::CapacityExhausted(_)
        )
    }
}

/// Error returned while parsing user-task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown user task status: {0}")]
pub struct ParseUserTaskStatusError(pub String);

/// Error returned while parsing staff roles or statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown staff {kind}: {value}")]
pub struct ParseStaffError {
    /// Which attribute failed to parse.
    pub kind: &'static str,
    /// The raw stored value.
    pub value: String,
}
