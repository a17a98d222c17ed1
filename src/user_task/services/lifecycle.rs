//! Service layer for receiving, completing, and reviewing user tasks.

use crate::config::LifecycleConfig;
use crate::user_task::{
    domain::{
        AppId, AppUserId, Operator, StaffUser, Task, TaskId, UserTask, UserTaskDomainError,
        UserTaskId, UserTaskLog, UserTaskStatus, time,
    },
    ports::{
        RepositoryError, ReviewerPicker, TaskRepository, TransitionCommit, UserTaskRepository,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for user-task lifecycle operations.
#[derive(Debug, Error)]
pub enum UserTaskLifecycleError {
    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] UserTaskDomainError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The referenced user task does not exist.
    #[error("user task not found: {0}")]
    UserTaskNotFound(UserTaskId),

    /// Every commit attempt lost an optimistic race.
    #[error("gave up after {attempts} conflicting commit attempt(s)")]
    ConcurrentModification {
        /// Number of attempts made.
        attempts: u32,
    },
}

impl UserTaskLifecycleError {
    /// Returns `true` for eligibility failures the end user can be told
    /// about: limit reached, cooldown active, or no capacity left.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Domain(err) => err.is_eligibility_failure(),
            _ => false,
        }
    }
}

/// Result type for user-task lifecycle service operations.
pub type UserTaskLifecycleResult<T> = Result<T, UserTaskLifecycleError>;

/// Orchestrates user-task transitions against a store and a reviewer picker.
///
/// Every transition is persisted through a single
/// [`UserTaskRepository::commit`]. Commits that lose an optimistic race are
/// retried against freshly loaded state, re-running every precondition.
#[derive(Clone)]
pub struct UserTaskLifecycleService<S, P, C>
where
    S: TaskRepository + UserTaskRepository,
    P: ReviewerPicker,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    reviewers: Arc<P>,
    clock: Arc<C>,
    config: LifecycleConfig,
}

impl<S, P, C> UserTaskLifecycleService<S, P, C>
where
    S: TaskRepository + UserTaskRepository,
    P: ReviewerPicker,
    C: Clock + Send + Sync,
{
    /// Creates a service with default lifecycle configuration.
    #[must_use]
    pub fn new(store: Arc<S>, reviewers: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            store,
            reviewers,
            clock,
            config: LifecycleConfig::default(),
        }
    }

    /// Replaces the lifecycle configuration.
    #[must_use]
    pub const fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active lifecycle configuration.
    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Records that an end user took on a task.
    ///
    /// Checks the per-person limit, then the cooldown, then remaining
    /// capacity. On success the task loses one slot, the user task is stored,
    /// and a `Received -> Received` audit record is appended, all in one
    /// commit.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::Domain`] when the candidate is not
    /// `Received`, belongs to another task, or fails an eligibility check.
    /// Returns [`UserTaskLifecycleError::ConcurrentModification`] when every
    /// commit attempt races with another writer. Slots may still remain when
    /// this happens: with more concurrent receivers than
    /// `max_commit_attempts`, a caller can lose every race while capacity is
    /// left, so callers may retry the whole operation.
    pub async fn receive(
        &self,
        candidate: UserTask,
        task: Task,
    ) -> UserTaskLifecycleResult<UserTask> {
        let mut current = task;
        let mut attempt = 1;
        loop {
            self.check_receive(&candidate, &current).await?;

            let expected_version = current.version();
            let mut updated = current.clone();
            updated.take_slot()?;
            let left_amount = updated.left_amount();
            let log = UserTaskLog::record(
                &candidate,
                Operator::end_user_of(&candidate),
                candidate.created_at(),
                UserTaskStatus::Received,
                UserTaskStatus::Received,
            );
            let commit =
                TransitionCommit::insert(candidate.clone(), log).with_task(updated, expected_version);

            if self.try_commit(&commit, attempt).await? {
                info!(
                    user_task_id = %candidate.id(),
                    task_id = %candidate.task_id(),
                    app_id = candidate.app_id().value(),
                    left_amount,
                    "user task received"
                );
                return Ok(candidate);
            }
            current = self.reload_task(current.id()).await?;
            attempt += 1;
        }
    }

    /// Marks a received user task completed.
    ///
    /// `completed_at` is taken from the clock and the review deadline is
    /// derived from the task's review period. A random active reviewer is
    /// assigned when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::InvalidTransition`] (wrapped) when the
    /// user task is not in `from_status` or `from_status` cannot move to
    /// `Completed`, and [`UserTaskDomainError::TaskMismatch`] when the user
    /// task belongs to another task.
    pub async fn complete(
        &self,
        user_task: UserTask,
        task: Task,
        from_status: UserTaskStatus,
    ) -> UserTaskLifecycleResult<UserTask> {
        check_complete(&user_task, &task, from_status).inspect_err(log_rejection)?;

        let completed_at = self.clock.utc();
        let reviewer = self.reviewers.pick_random_active_reviewer().await?;
        let mut current_task = task;
        let mut current = user_task;
        let mut attempt = 1;
        loop {
            let review_end_at = time::review_deadline(
                completed_at,
                current_task.review_period(),
                self.config.unlimited_review_hours,
            );
            let mut completed = current.clone();
            completed.complete(completed_at, review_end_at, reviewer)?;
            let expected_version = current_task.version();
            let mut updated = current_task.clone();
            updated.record_completion()?;
            let log = UserTaskLog::record(
                &completed,
                Operator::end_user_of(&completed),
                completed_at,
                from_status,
                UserTaskStatus::Completed,
            );
            let commit = TransitionCommit::update(completed.clone(), from_status, log)
                .with_task(updated, expected_version);

            if self.try_commit(&commit, attempt).await? {
                info!(
                    user_task_id = %completed.id(),
                    task_id = %completed.task_id(),
                    reviewer = ?completed.reviewer_user_id().map(|id| id.to_string()),
                    %review_end_at,
                    "user task completed"
                );
                return Ok(completed);
            }
            current_task = self.reload_task(current_task.id()).await?;
            current = self.reload_user_task(current.id()).await?;
            check_complete(&current, &current_task, from_status).inspect_err(log_rejection)?;
            attempt += 1;
        }
    }

    /// Records a staff review of a completed user task.
    ///
    /// `Accepted` also bumps the task's accepted counter; `Rejected` leaves
    /// the task untouched. The audit record carries the completion time.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::InvalidTransition`] (wrapped) when
    /// `to_status` is not a review outcome or the user task is not
    /// `Completed`, and [`UserTaskDomainError::TaskMismatch`] when the user
    /// task belongs to another task.
    pub async fn review(
        &self,
        staff: &StaffUser,
        user_task: UserTask,
        task: Task,
        to_status: UserTaskStatus,
    ) -> UserTaskLifecycleResult<UserTask> {
        check_review(&user_task, &task, to_status).inspect_err(log_rejection)?;

        let reviewed_at = self.clock.utc();
        let mut current_task = task;
        let mut current = user_task;
        let mut attempt = 1;
        loop {
            let logged_at = current.completed_at().unwrap_or(reviewed_at);
            let mut reviewed = current.clone();
            reviewed.review(to_status, staff.id(), reviewed_at)?;
            let log = UserTaskLog::record(
                &reviewed,
                Operator::Staff {
                    user_id: staff.id(),
                },
                logged_at,
                UserTaskStatus::Completed,
                to_status,
            );
            let mut commit =
                TransitionCommit::update(reviewed.clone(), UserTaskStatus::Completed, log);
            if to_status == UserTaskStatus::Accepted {
                let expected_version = current_task.version();
                let mut updated = current_task.clone();
                updated.record_acceptance()?;
                commit = commit.with_task(updated, expected_version);
            }

            if self.try_commit(&commit, attempt).await? {
                info!(
                    user_task_id = %reviewed.id(),
                    task_id = %reviewed.task_id(),
                    staff_id = %staff.id(),
                    outcome = %to_status,
                    "user task reviewed"
                );
                return Ok(reviewed);
            }
            current_task = self.reload_task(current_task.id()).await?;
            current = self.reload_user_task(current.id()).await?;
            check_review(&current, &current_task, to_status).inspect_err(log_rejection)?;
            attempt += 1;
        }
    }

    /// Counts user tasks an end user holds for a task.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::Repository`] when the lookup fails.
    pub async fn count(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> UserTaskLifecycleResult<u64> {
        Ok(self
            .store
            .count_by_channel_user_task(app_id, app_user_id, task_id)
            .await?)
    }

    /// Retrieves a user task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::Repository`] when the lookup fails.
    pub async fn find_one(&self, id: UserTaskId) -> UserTaskLifecycleResult<Option<UserTask>> {
        Ok(UserTaskRepository::find_by_id(self.store.as_ref(), id).await?)
    }

    /// Retrieves the most recent user task an end user received for a task.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::Repository`] when the lookup fails.
    pub async fn find_latest(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> UserTaskLifecycleResult<Option<UserTask>> {
        Ok(self
            .store
            .find_latest_by_channel_user_task(app_id, app_user_id, task_id)
            .await?)
    }

    /// Retrieves a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::Repository`] when the lookup fails.
    pub async fn find_task(&self, id: TaskId) -> UserTaskLifecycleResult<Option<Task>> {
        Ok(TaskRepository::find_by_id(self.store.as_ref(), id).await?)
    }

    /// Loads the task and receives a fresh user task for the end user,
    /// stamped with the current clock time.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::TaskNotFound`] when the task does
    /// not exist, otherwise as [`Self::receive`].
    pub async fn receive_for(
        &self,
        task_id: TaskId,
        app_id: AppId,
        app_user_id: AppUserId,
    ) -> UserTaskLifecycleResult<UserTask> {
        let task = self.reload_task(task_id).await?;
        let candidate = UserTask::receive(app_id, app_user_id, task_id, self.clock.utc());
        self.receive(candidate, task).await
    }

    /// Loads a user task and its task, then completes it from its current
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::UserTaskNotFound`] or
    /// [`UserTaskLifecycleError::TaskNotFound`] when either is missing,
    /// otherwise as [`Self::complete`].
    pub async fn complete_by_id(&self, id: UserTaskId) -> UserTaskLifecycleResult<UserTask> {
        let user_task = self.reload_user_task(id).await?;
        let task = self.reload_task(user_task.task_id()).await?;
        let from_status = user_task.status();
        self.complete(user_task, task, from_status).await
    }

    /// Loads a user task and its task, then records the review.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskLifecycleError::UserTaskNotFound`] or
    /// [`UserTaskLifecycleError::TaskNotFound`] when either is missing,
    /// otherwise as [`Self::review`].
    pub async fn review_by_id(
        &self,
        staff: &StaffUser,
        id: UserTaskId,
        to_status: UserTaskStatus,
    ) -> UserTaskLifecycleResult<UserTask> {
        let user_task = self.reload_user_task(id).await?;
        let task = self.reload_task(user_task.task_id()).await?;
        self.review(staff, user_task, task, to_status).await
    }

    async fn check_receive(&self, candidate: &UserTask, task: &Task) -> UserTaskLifecycleResult<()> {
        let outcome = self.receive_eligibility(candidate, task).await;
        if let Err(UserTaskLifecycleError::Domain(err)) = &outcome {
            log_rejection(err);
        }
        outcome
    }

    async fn receive_eligibility(
        &self,
        candidate: &UserTask,
        task: &Task,
    ) -> UserTaskLifecycleResult<()> {
        if candidate.status() != UserTaskStatus::Received {
            return Err(UserTaskDomainError::InvalidTransition {
                from: candidate.status(),
                to: UserTaskStatus::Received,
            }
            .into());
        }
        ensure_same_task(candidate, task)?;

        let limit = task.each_person_limit();
        if limit > 0 {
            let held = self
                .store
                .count_by_channel_user_task(
                    candidate.app_id(),
                    candidate.app_user_id(),
                    candidate.task_id(),
                )
                .await?;
            if held >= u64::from(limit) {
                return Err(UserTaskDomainError::LimitExceeded { limit }.into());
            }
        }

        let recycle_days = task.recycle_days_limit();
        if recycle_days > 0 {
            let latest = self
                .store
                .find_latest_by_channel_user_task(
                    candidate.app_id(),
                    candidate.app_user_id(),
                    candidate.task_id(),
                )
                .await?;
            if let Some(previous) = latest {
                let (earlier, later) = (previous.created_at(), candidate.created_at());
                if !time::cooldown_elapsed(earlier, later, recycle_days) {
                    return Err(UserTaskDomainError::CooldownActive {
                        recycle_days,
                        elapsed_days: time::days_between(earlier, later),
                    }
                    .into());
                }
            }
        }

        if !task.has_capacity() {
            return Err(UserTaskDomainError::CapacityExhausted(task.id()).into());
        }
        Ok(())
    }

    /// Commits once. `Ok(false)` means the commit lost a race and the caller
    /// should reload and retry.
    async fn try_commit(
        &self,
        commit: &TransitionCommit,
        attempt: u32,
    ) -> UserTaskLifecycleResult<bool> {
        match self.store.commit(commit).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_stale() => {
                let max_attempts = self.config.max_commit_attempts;
                if attempt >= max_attempts {
                    warn!(attempt, max_attempts, error = %err, "giving up on conflicting commit");
                    return Err(UserTaskLifecycleError::ConcurrentModification { attempts: attempt });
                }
                warn!(attempt, max_attempts, error = %err, "commit conflicted, retrying");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn reload_task(&self, id: TaskId) -> UserTaskLifecycleResult<Task> {
        TaskRepository::find_by_id(self.store.as_ref(), id)
            .await?
            .ok_or(UserTaskLifecycleError::TaskNotFound(id))
    }

    async fn reload_user_task(&self, id: UserTaskId) -> UserTaskLifecycleResult<UserTask> {
        UserTaskRepository::find_by_id(self.store.as_ref(), id)
            .await?
            .ok_or(UserTaskLifecycleError::UserTaskNotFound(id))
    }
}

fn ensure_same_task(user_task: &UserTask, task: &Task) -> Result<(), UserTaskDomainError> {
    if user_task.task_id() == task.id() {
        Ok(())
    } else {
        Err(UserTaskDomainError::TaskMismatch {
            expected: task.id(),
            actual: user_task.task_id(),
        })
    }
}

fn check_complete(
    user_task: &UserTask,
    task: &Task,
    from_status: UserTaskStatus,
) -> Result<(), UserTaskDomainError> {
    if user_task.status() != from_status {
        return Err(UserTaskDomainError::InvalidTransition {
            from: user_task.status(),
            to: UserTaskStatus::Completed,
        });
    }
    if !from_status.can_transition_to(UserTaskStatus::Completed) {
        return Err(UserTaskDomainError::InvalidTransition {
            from: from_status,
            to: UserTaskStatus::Completed,
        });
    }
    ensure_same_task(user_task, task)
}

fn check_review(
    user_task: &UserTask,
    task: &Task,
    to_status: UserTaskStatus,
) -> Result<(), UserTaskDomainError> {
    if !to_status.is_review_outcome() || user_task.status() != UserTaskStatus::Completed {
        return Err(UserTaskDomainError::InvalidTransition {
            from: user_task.status(),
            to: to_status,
        });
    }
    ensure_same_task(user_task, task)
}

fn log_rejection(err: &UserTaskDomainError) {
    debug!(error = %err, eligibility = err.is_eligibility_failure(), "transition rejected");
}
