//! Repository ports for tasks, user tasks, audit records, and staff.

use crate::user_task::domain::{
    AppId, AppUserId, StaffRole, StaffUser, StaffUserId, Task, TaskId, UserTask, UserTaskId,
    UserTaskLog, UserTaskStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Task campaign persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateTask`] when the identifier exists.
    async fn store(&self, task: &Task) -> RepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> RepositoryResult<Option<Task>>;
}

/// Write applied to the task row as part of a [`TransitionCommit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    /// Task with its counters already mutated.
    pub task: Task,
    /// Version the stored row must still carry for the write to apply.
    pub expected_version: u64,
}

/// How the user task is written as part of a [`TransitionCommit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserTaskWrite {
    /// The user task is new.
    Insert,
    /// The user task already exists and must still be in `expected_status`.
    Update {
        /// Status the stored user task must carry for the write to apply.
        expected_status: UserTaskStatus,
    },
}

/// Everything one lifecycle operation persists, applied atomically.
///
/// Adapters must write the task update (if any), the user task, and the audit
/// record in a single unit of work: either all become visible or none do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionCommit {
    /// Counter mutation on the task, if the transition moves one.
    pub task_update: Option<TaskUpdate>,
    /// User task after the transition.
    pub user_task: UserTask,
    /// Whether the user task is inserted or updated.
    pub user_task_write: UserTaskWrite,
    /// Audit record appended for the transition.
    pub log: UserTaskLog,
}

impl TransitionCommit {
    /// Creates a commit that inserts a new user task.
    #[must_use]
    pub const fn insert(user_task: UserTask, log: UserTaskLog) -> Self {
        Self {
            task_update: None,
            user_task,
            user_task_write: UserTaskWrite::Insert,
            log,
        }
    }

    /// Creates a commit that updates an existing user task, guarded by the
    /// status it was read in.
    #[must_use]
    pub const fn update(
        user_task: UserTask,
        expected_status: UserTaskStatus,
        log: UserTaskLog,
    ) -> Self {
        Self {
            task_update: None,
            user_task,
            user_task_write: UserTaskWrite::Update { expected_status },
            log,
        }
    }

    /// Attaches a task counter mutation guarded by `expected_version`.
    #[must_use]
    pub fn with_task(mut self, task: Task, expected_version: u64) -> Self {
        self.task_update = Some(TaskUpdate {
            task,
            expected_version,
        });
        self
    }
}

/// User-task and audit-log persistence contract.
#[async_trait]
pub trait UserTaskRepository: Send + Sync {
    /// Finds a user task by identifier.
    async fn find_by_id(&self, id: UserTaskId) -> RepositoryResult<Option<UserTask>>;

    /// Finds the most recently received user task for a channel user and
    /// task.
    ///
    /// Ties on `created_at` go to the greatest identifier.
    async fn find_latest_by_channel_user_task(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<UserTask>>;

    /// Counts user tasks for a channel user and task.
    async fn count_by_channel_user_task(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> RepositoryResult<u64>;

    /// Returns the audit records of a user task, oldest first.
    async fn logs_for_user_task(&self, id: UserTaskId) -> RepositoryResult<Vec<UserTaskLog>>;

    /// Returns the audit records of every user task of a task, oldest first.
    async fn logs_for_task(&self, task_id: TaskId) -> RepositoryResult<Vec<UserTaskLog>>;

    /// Applies a lifecycle transition atomically.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::StaleTask`] when the stored task version no
    /// longer matches [`TaskUpdate::expected_version`],
    /// [`RepositoryError::StaleUserTask`] when the stored user task left the
    /// expected status, [`RepositoryError::DuplicateUserTask`] when inserting
    /// an existing user task, and [`RepositoryError::UserTaskNotFound`] when
    /// updating a missing one. Nothing is written when any error is returned.
    async fn commit(&self, commit: &TransitionCommit) -> RepositoryResult<()>;
}

/// Staff account persistence contract.
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Stores a new staff account.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateStaffUser`] when the identifier
    /// exists.
    async fn store(&self, staff: &StaffUser) -> RepositoryResult<()>;

    /// Finds a staff account by identifier.
    async fn find_by_id(&self, id: StaffUserId) -> RepositoryResult<Option<StaffUser>>;

    /// Picks one active account holding `role` at random.
    ///
    /// Returns `None` when no such account exists.
    async fn find_one_random_active(&self, role: StaffRole) -> RepositoryResult<Option<StaffUser>>;
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A user task with the same identifier already exists.
    #[error("duplicate user task identifier: {0}")]
    DuplicateUserTask(UserTaskId),

    /// A staff account with the same identifier already exists.
    #[error("duplicate staff user identifier: {0}")]
    DuplicateStaffUser(StaffUserId),

    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The user task was not found.
    #[error("user task not found: {0}")]
    UserTaskNotFound(UserTaskId),

    /// The task changed since it was read.
    #[error("task {task_id} is stale: expected version {expected_version}")]
    StaleTask {
        /// Task whose version moved.
        task_id: TaskId,
        /// Version the commit was based on.
        expected_version: u64,
    },

    /// The user task changed status since it was read.
    #[error("user task {user_task_id} is no longer {expected_status}")]
    StaleUserTask {
        /// User task whose status moved.
        user_task_id: UserTaskId,
        /// Status the commit was based on.
        expected_status: UserTaskStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Returns `true` when the commit lost an optimistic race and may be
    /// retried against fresh state.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleTask { .. } | Self::StaleUserTask { .. })
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
