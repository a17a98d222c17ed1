//! User-task entity and its status machine.

use super::{
    AppId, AppUserId, ParseUserTaskStatusError, StaffUserId, TaskId, UserTaskDomainError,
    UserTaskId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one end user's instance of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserTaskStatus {
    /// The end user claimed the task.
    Received,
    /// The end user submitted the task for review.
    Completed,
    /// A reviewer accepted the completion.
    Accepted,
    /// A reviewer rejected the completion.
    Rejected,
}

impl UserTaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Completed => "completed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Returns `true` when no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    /// Returns `true` when `self -> target` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Received, Self::Completed)
                | (Self::Completed, Self::Accepted | Self::Rejected)
        )
    }

    /// Returns `true` for the statuses a review may produce.
    #[must_use]
    pub const fn is_review_outcome(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl fmt::Display for UserTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UserTaskStatus {
    type Error = ParseUserTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "received" => Ok(Self::Received),
            "completed" => Ok(Self::Completed),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseUserTaskStatusError(value.to_owned())),
        }
    }
}

/// One end user's instance of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTask {
    id: UserTaskId,
    app_id: AppId,
    app_user_id: AppUserId,
    task_id: TaskId,
    status: UserTaskStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    review_end_at: Option<DateTime<Utc>>,
    reviewer_user_id: Option<StaffUserId>,
    reviewed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted user task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedUserTaskData {
    /// Persisted identifier.
    pub id: UserTaskId,
    /// Channel the task was received through.
    pub app_id: AppId,
    /// End user within the channel.
    pub app_user_id: AppUserId,
    /// Task campaign.
    pub task_id: TaskId,
    /// Persisted status.
    pub status: UserTaskStatus,
    /// Receive timestamp.
    pub created_at: DateTime<Utc>,
    /// Completion timestamp, if completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Review deadline, if completed.
    pub review_end_at: Option<DateTime<Utc>>,
    /// Assigned reviewer, if any.
    pub reviewer_user_id: Option<StaffUserId>,
    /// Review timestamp, if reviewed.
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl UserTask {
    /// Creates a freshly received user task.
    #[must_use]
    pub fn receive(
        app_id: AppId,
        app_user_id: AppUserId,
        task_id: TaskId,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserTaskId::new(),
            app_id,
            app_user_id,
            task_id,
            status: UserTaskStatus::Received,
            created_at: received_at,
            completed_at: None,
            review_end_at: None,
            reviewer_user_id: None,
            reviewed_at: None,
        }
    }

    /// Reconstructs a user task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedUserTaskData) -> Self {
        Self {
            id: data.id,
            app_id: data.app_id,
            app_user_id: data.app_user_id,
            task_id: data.task_id,
            status: data.status,
            created_at: data.created_at,
            completed_at: data.completed_at,
            review_end_at: data.review_end_at,
            reviewer_user_id: data.reviewer_user_id,
            reviewed_at: data.reviewed_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> UserTaskId {
        self.id
    }

    /// Returns the app channel.
    #[must_use]
    pub const fn app_id(&self) -> AppId {
        self.app_id
    }

    /// Returns the end-user identifier.
    #[must_use]
    pub const fn app_user_id(&self) -> &AppUserId {
        &self.app_user_id
    }

    /// Returns the task campaign identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> UserTaskStatus {
        self.status
    }

    /// Returns the receive timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the review deadline.
    #[must_use]
    pub const fn review_end_at(&self) -> Option<DateTime<Utc>> {
        self.review_end_at
    }

    /// Returns the assigned reviewer.
    #[must_use]
    pub const fn reviewer_user_id(&self) -> Option<StaffUserId> {
        self.reviewer_user_id
    }

    /// Returns the review timestamp.
    #[must_use]
    pub const fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    /// Marks the task completed and records the review deadline and reviewer.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::InvalidTransition`] unless the task is
    /// currently [`UserTaskStatus::Received`].
    pub fn complete(
        &mut self,
        completed_at: DateTime<Utc>,
        review_end_at: DateTime<Utc>,
        reviewer: Option<StaffUserId>,
    ) -> Result<(), UserTaskDomainError> {
        self.ensure_transition(UserTaskStatus::Completed)?;
        self.status = UserTaskStatus::Completed;
        self.completed_at = Some(completed_at);
        self.review_end_at = Some(review_end_at);
        if reviewer.is_some() {
            self.reviewer_user_id = reviewer;
        }
        Ok(())
    }

    /// Records a review outcome.
    ///
    /// A reviewer assigned at completion is kept; otherwise the reviewing
    /// staff member is recorded as the reviewer.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::InvalidTransition`] when `outcome` is not
    /// a review outcome or the task is not [`UserTaskStatus::Completed`].
    pub fn review(
        &mut self,
        outcome: UserTaskStatus,
        reviewer: StaffUserId,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), UserTaskDomainError> {
        if !outcome.is_review_outcome() {
            return Err(UserTaskDomainError::InvalidTransition {
                from: UserTaskStatus::Completed,
                to: outcome,
            });
        }
        self.ensure_transition(outcome)?;
        self.status = outcome;
        self.reviewed_at = Some(reviewed_at);
        if self.reviewer_user_id.is_none() {
            self.reviewer_user_id = Some(reviewer);
        }
        Ok(())
    }

    fn ensure_transition(&self, target: UserTaskStatus) -> Result<(), UserTaskDomainError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(UserTaskDomainError::InvalidTransition {
                from: self.status,
                to: target,
            })
        }
    }
}
