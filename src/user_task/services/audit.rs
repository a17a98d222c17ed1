//! Read-side access to the user-task audit trail.

use super::lifecycle::{UserTaskLifecycleError, UserTaskLifecycleResult};
use crate::user_task::{
    domain::{LedgerReconciliation, TaskId, UserTaskId, UserTaskLog},
    ports::{TaskRepository, UserTaskRepository},
};
use std::sync::Arc;
use tracing::warn;

/// Exposes audit history and checks task counters against it.
#[derive(Clone)]
pub struct AuditTrailService<S>
where
    S: TaskRepository + UserTaskRepository,
{
    store: Arc<S>,
}

impl<S> AuditTrailService<S>
where
    S: TaskRepository + UserTaskRepository,
{
    /// Creates a new audit trail service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns every audit record of a user task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::Repository`] when the lookup fails.
    pub async fn history(&self, id: UserTaskId) -> UserTaskLifecycleResult<Vec<UserTaskLog>> {
        Ok(self.store.logs_for_user_task(id).await?)
    }

    /// Replays the audit records of a task against its stored counters.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::TaskNotFound`] when the task does
    /// not exist, or [`UserTaskLifecycleError::Repository`] when a lookup
    /// fails.
    pub async fn reconcile(&self, task_id: TaskId) -> UserTaskLifecycleResult<LedgerReconciliation> {
        let task = TaskRepository::find_by_id(self.store.as_ref(), task_id)
            .await?
            .ok_or(UserTaskLifecycleError::TaskNotFound(task_id))?;
        let logs = self.store.logs_for_task(task_id).await?;
        let report = LedgerReconciliation::replay(&task, &logs);
        if !report.is_consistent() {
            warn!(task_id = %task_id, ?report, "task counters disagree with audit trail");
        }
        Ok(report)
    }
}
