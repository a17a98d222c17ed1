//! In-memory task, user-task, and audit-log store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::user_task::{
    domain::{AppId, AppUserId, Task, TaskId, UserTask, UserTaskId, UserTaskLog},
    ports::{
        RepositoryError, RepositoryResult, TaskRepository, TransitionCommit, UserTaskRepository,
        UserTaskWrite,
    },
};

/// Thread-safe in-memory store backing both [`TaskRepository`] and
/// [`UserTaskRepository`].
///
/// A single lock guards all three collections so a [`TransitionCommit`] is
/// applied atomically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserTaskStore {
    state: Arc<RwLock<InMemoryUserTaskState>>,
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryUserTaskState {
    pub(crate) tasks: HashMap<TaskId, Task>,
    pub(crate) user_tasks: HashMap<UserTaskId, UserTask>,
    pub(crate) logs: Vec<UserTaskLog>,
}

impl InMemoryUserTaskState {
    fn matching<'a>(
        &'a self,
        app_id: AppId,
        app_user_id: &'a AppUserId,
        task_id: TaskId,
    ) -> impl Iterator<Item = &'a UserTask> + 'a {
        self.user_tasks.values().filter(move |user_task| {
            user_task.app_id() == app_id
                && user_task.app_user_id() == app_user_id
                && user_task.task_id() == task_id
        })
    }

    fn check(&self, commit: &TransitionCommit) -> RepositoryResult<()> {
        if let Some(update) = &commit.task_update {
            let task_id = update.task.id();
            let stored = self
                .tasks
                .get(&task_id)
                .ok_or(RepositoryError::TaskNotFound(task_id))?;
            if stored.version() != update.expected_version {
                return Err(RepositoryError::StaleTask {
                    task_id,
                    expected_version: update.expected_version,
                });
            }
        }

        let user_task_id = commit.user_task.id();
        let stored = self.user_tasks.get(&user_task_id);
        match (commit.user_task_write, stored) {
            (UserTaskWrite::Insert, Some(_)) => {
                Err(RepositoryError::DuplicateUserTask(user_task_id))
            }
            (UserTaskWrite::Insert, None) => Ok(()),
            (UserTaskWrite::Update { .. }, None) => {
                Err(RepositoryError::UserTaskNotFound(user_task_id))
            }
            (UserTaskWrite::Update { expected_status }, Some(current))
                if current.status() != expected_status =>
            {
                Err(RepositoryError::StaleUserTask {
                    user_task_id,
                    expected_status,
                })
            }
            (UserTaskWrite::Update { .. }, Some(_)) => Ok(()),
        }
    }
}

impl InMemoryUserTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, InMemoryUserTaskState>> {
        self.state
            .read()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, InMemoryUserTaskState>> {
        self.state
            .write()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl TaskRepository for InMemoryUserTaskStore {
    async fn store(&self, task: &Task) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(RepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> RepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }
}

#[async_trait]
impl UserTaskRepository for InMemoryUserTaskStore {
    async fn find_by_id(&self, id: UserTaskId) -> RepositoryResult<Option<UserTask>> {
        let state = self.read()?;
        Ok(state.user_tasks.get(&id).cloned())
    }

    async fn find_latest_by_channel_user_task(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<UserTask>> {
        let state = self.read()?;
        Ok(state
            .matching(app_id, app_user_id, task_id)
            .max_by_key(|user_task| (user_task.created_at(), user_task.id()))
            .cloned())
    }

    async fn count_by_channel_user_task(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> RepositoryResult<u64> {
        let state = self.read()?;
        let count = state.matching(app_id, app_user_id, task_id).count();
        u64::try_from(count).map_err(RepositoryError::persistence)
    }

    async fn logs_for_user_task(&self, id: UserTaskId) -> RepositoryResult<Vec<UserTaskLog>> {
        let state = self.read()?;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.user_task_id() == id)
            .cloned()
            .collect())
    }

    async fn logs_for_task(&self, task_id: TaskId) -> RepositoryResult<Vec<UserTaskLog>> {
        let state = self.read()?;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn commit(&self, commit: &TransitionCommit) -> RepositoryResult<()> {
        let mut state = self.write()?;
        state.check(commit)?;

        if let Some(update) = &commit.task_update {
            state.tasks.insert(update.task.id(), update.task.clone());
        }
        state
            .user_tasks
            .insert(commit.user_task.id(), commit.user_task.clone());
        state.logs.push(commit.log.clone());
        Ok(())
    }
}
