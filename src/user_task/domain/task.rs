//! Task campaign definition and its capacity ledger.
//!
//! The three counters on [`Task`] (`left_amount`, `completed_amount`,
//! `accepted_amount`) are private and only move through the ledger methods
//! [`Task::take_slot`], [`Task::record_completion`] and
//! [`Task::record_acceptance`]. Every ledger mutation bumps [`Task::version`],
//! which adapters use as the optimistic-concurrency token when committing.

use super::{TaskId, UserTaskDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Campaign-level limits supplied when a task is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskLimits {
    /// Maximum receives per end user; 0 means unlimited.
    pub each_person_limit: u32,
    /// Cooldown in whole days between receives; 0 means none.
    pub recycle_days_limit: u32,
    /// Seconds allowed for review; `None` or 0 means effectively unlimited.
    pub review_period: Option<u64>,
}

/// Task campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    flow: u64,
    total_amount: u64,
    limits: TaskLimits,
    left_amount: u64,
    completed_amount: u64,
    accepted_amount: u64,
    version: u64,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identifier.
    pub id: TaskId,
    /// Display title.
    pub title: String,
    /// Flow credited per accepted instance.
    pub flow: u64,
    /// Slots the campaign started with.
    pub total_amount: u64,
    /// Eligibility limits.
    pub limits: TaskLimits,
    /// Remaining receivable slots.
    pub left_amount: u64,
    /// Completions recorded so far.
    pub completed_amount: u64,
    /// Acceptances recorded so far.
    pub accepted_amount: u64,
    /// Optimistic-concurrency version.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new campaign with all slots available.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        flow: u64,
        total_amount: u64,
        limits: TaskLimits,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            flow,
            total_amount,
            limits,
            left_amount: total_amount,
            completed_amount: 0,
            accepted_amount: 0,
            version: 0,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a task from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::InvalidCapacity`] when the stored
    /// `left_amount` exceeds `total_amount`.
    pub fn from_persisted(data: PersistedTaskData) -> Result<Self, UserTaskDomainError> {
        if data.left_amount > data.total_amount {
            return Err(UserTaskDomainError::InvalidCapacity {
                total: data.total_amount,
                left: data.left_amount,
            });
        }
        Ok(Self {
            id: data.id,
            title: data.title,
            flow: data.flow,
            total_amount: data.total_amount,
            limits: data.limits,
            left_amount: data.left_amount,
            completed_amount: data.completed_amount,
            accepted_amount: data.accepted_amount,
            version: data.version,
            created_at: data.created_at,
        })
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the flow credited per accepted instance.
    #[must_use]
    pub const fn flow(&self) -> u64 {
        self.flow
    }

    /// Returns the slots the campaign started with.
    #[must_use]
    pub const fn total_amount(&self) -> u64 {
        self.total_amount
    }

    /// Returns the eligibility limits.
    #[must_use]
    pub const fn limits(&self) -> TaskLimits {
        self.limits
    }

    /// Returns the per-person receive limit (0 = unlimited).
    #[must_use]
    pub const fn each_person_limit(&self) -> u32 {
        self.limits.each_person_limit
    }

    /// Returns the cooldown in days (0 = none).
    #[must_use]
    pub const fn recycle_days_limit(&self) -> u32 {
        self.limits.recycle_days_limit
    }

    /// Returns the review period in seconds, if set.
    #[must_use]
    pub const fn review_period(&self) -> Option<u64> {
        self.limits.review_period
    }

    /// Returns the remaining receivable slots.
    #[must_use]
    pub const fn left_amount(&self) -> u64 {
        self.left_amount
    }

    /// Returns the number of completions recorded.
    #[must_use]
    pub const fn completed_amount(&self) -> u64 {
        self.completed_amount
    }

    /// Returns the number of acceptances recorded.
    #[must_use]
    pub const fn accepted_amount(&self) -> u64 {
        self.accepted_amount
    }

    /// Returns the optimistic-concurrency version.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` while at least one slot is receivable.
    #[must_use]
    pub const fn has_capacity(&self) -> bool {
        self.left_amount > 0
    }

    /// Claims one receivable slot.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::CapacityExhausted`] when no slot is
    /// left; the task is unchanged in that case.
    pub fn take_slot(&mut self) -> Result<(), UserTaskDomainError> {
        let left = self
            .left_amount
            .checked_sub(1)
            .ok_or(UserTaskDomainError::CapacityExhausted(self.id))?;
        let version = self.next_version()?;
        self.left_amount = left;
        self.version = version;
        Ok(())
    }

    /// Records one completion.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::CounterOverflow`] if the counter is
    /// saturated.
    pub fn record_completion(&mut self) -> Result<(), UserTaskDomainError> {
        let completed = self.increment(self.completed_amount)?;
        let version = self.next_version()?;
        self.completed_amount = completed;
        self.version = version;
        Ok(())
    }

    /// Records one acceptance.
    ///
    /// # Errors
    ///
    /// Returns [`UserTaskDomainError::CounterOverflow`] if the counter is
    /// saturated.
    pub fn record_acceptance(&mut self) -> Result<(), UserTaskDomainError> {
        let accepted = self.increment(self.accepted_amount)?;
        let version = self.next_version()?;
        self.accepted_amount = accepted;
        self.version = version;
        Ok(())
    }

    fn next_version(&self) -> Result<u64, UserTaskDomainError> {
        self.increment(self.version)
    }

    fn increment(&self, counter: u64) -> Result<u64, UserTaskDomainError> {
        counter
            .checked_add(1)
            .ok_or(UserTaskDomainError::CounterOverflow(self.id))
    }
}
