//! Append-only audit records for user-task status transitions.

use super::{
    AppId, AppUserId, StaffUserId, Task, TaskId, UserTask, UserTaskId, UserTaskLogId,
    UserTaskStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who performed a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operator {
    /// An end user acting through an app channel.
    EndUser {
        /// Channel the end user acted through.
        app_id: AppId,
        /// End user within the channel.
        app_user_id: AppUserId,
    },
    /// A staff member, typically a reviewer.
    Staff {
        /// Staff account identifier.
        user_id: StaffUserId,
    },
}

impl Operator {
    /// Returns the end-user operator that owns `user_task`.
    #[must_use]
    pub fn end_user_of(user_task: &UserTask) -> Self {
        Self::EndUser {
            app_id: user_task.app_id(),
            app_user_id: user_task.app_user_id().clone(),
        }
    }
}

/// Immutable audit record of one user-task transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTaskLog {
    id: UserTaskLogId,
    user_task_id: UserTaskId,
    task_id: TaskId,
    operator: Operator,
    created_at: DateTime<Utc>,
    from_status: UserTaskStatus,
    to_status: UserTaskStatus,
}

/// Parameter object for reconstructing a persisted audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserTaskLogData {
    /// Persisted identifier.
    pub id: UserTaskLogId,
    /// User task the transition applied to.
    pub user_task_id: UserTaskId,
    /// Task campaign of the user task.
    pub task_id: TaskId,
    /// Actor.
    pub operator: Operator,
    /// Transition timestamp.
    pub created_at: DateTime<Utc>,
    /// Status before the transition.
    pub from_status: UserTaskStatus,
    /// Status after the transition.
    pub to_status: UserTaskStatus,
}

impl UserTaskLog {
    /// Records a transition of `user_task`.
    ///
    /// The record is taken at face value: the caller is responsible for a
    /// self-consistent `from`/`to` pair.
    #[must_use]
    pub fn record(
        user_task: &UserTask,
        operator: Operator,
        at: DateTime<Utc>,
        from_status: UserTaskStatus,
        to_status: UserTaskStatus,
    ) -> Self {
        Self {
            id: UserTaskLogId::new(),
            user_task_id: user_task.id(),
            task_id: user_task.task_id(),
            operator,
            created_at: at,
            from_status,
            to_status,
        }
    }

    /// Reconstructs an audit record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserTaskLogData) -> Self {
        Self {
            id: data.id,
            user_task_id: data.user_task_id,
            task_id: data.task_id,
            operator: data.operator,
            created_at: data.created_at,
            from_status: data.from_status,
            to_status: data.to_status,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> UserTaskLogId {
        self.id
    }

    /// Returns the user task the transition applied to.
    #[must_use]
    pub const fn user_task_id(&self) -> UserTaskId {
        self.user_task_id
    }

    /// Returns the task campaign.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the actor.
    #[must_use]
    pub const fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Returns the transition timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the status before the transition.
    #[must_use]
    pub const fn from_status(&self) -> UserTaskStatus {
        self.from_status
    }

    /// Returns the status after the transition.
    #[must_use]
    pub const fn to_status(&self) -> UserTaskStatus {
        self.to_status
    }

    /// Returns `true` for the record written when a task is received.
    #[must_use]
    pub fn is_receive(&self) -> bool {
        self.from_status == UserTaskStatus::Received && self.to_status == UserTaskStatus::Received
    }
}

/// Counter values replayed from audit records compared with a task's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReconciliation {
    /// Task the report covers.
    pub task_id: TaskId,
    /// Receives replayed from the log.
    pub logged_receives: u64,
    /// Slots consumed according to the task (`total - left`).
    pub consumed_slots: u64,
    /// Completions replayed from the log.
    pub logged_completions: u64,
    /// Completions according to the task.
    pub completed_amount: u64,
    /// Acceptances replayed from the log.
    pub logged_acceptances: u64,
    /// Acceptances according to the task.
    pub accepted_amount: u64,
}

impl LedgerReconciliation {
    /// Replays `logs` against the counters of `task`.
    ///
    /// Records belonging to other tasks are ignored.
    #[must_use]
    pub fn replay<'a>(task: &Task, logs: impl IntoIterator<Item = &'a UserTaskLog>) -> Self {
        let mut report = Self {
            task_id: task.id(),
            logged_receives: 0,
            consumed_slots: task.total_amount().saturating_sub(task.left_amount()),
            logged_completions: 0,
            completed_amount: task.completed_amount(),
            logged_acceptances: 0,
            accepted_amount: task.accepted_amount(),
        };
        for log in logs.into_iter().filter(|log| log.task_id() == task.id()) {
            if log.is_receive() {
                report.logged_receives = report.logged_receives.saturating_add(1);
            } else if log.to_status() == UserTaskStatus::Completed {
                report.logged_completions = report.logged_completions.saturating_add(1);
            } else if log.to_status() == UserTaskStatus::Accepted {
                report.logged_acceptances = report.logged_acceptances.saturating_add(1);
            }
        }
        report
    }

    /// Returns `true` when every replayed count matches its counter.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.logged_receives == self.consumed_slots
            && self.logged_completions == self.completed_amount
            && self.logged_acceptances == self.accepted_amount
    }
}
