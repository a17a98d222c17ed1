//! Snapshot persistence for collected statistics.

use crate::statistics::domain::{ReviewerTaskStatistics, StatisticsWindow, TaskAppStatistics};
use crate::user_task::{
    domain::{AppId, TaskId},
    ports::RepositoryResult,
};
use async_trait::async_trait;

/// Selects stored task/app snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskAppStatisticsFilter {
    /// Snapshots must overlap this window.
    pub window: StatisticsWindow,
    /// Restricts to one task.
    pub task_id: Option<TaskId>,
    /// Restricts to one app channel.
    pub app_id: Option<AppId>,
}

impl TaskAppStatisticsFilter {
    /// Matches every snapshot overlapping `window`.
    #[must_use]
    pub const fn overlapping(window: StatisticsWindow) -> Self {
        Self {
            window,
            task_id: None,
            app_id: None,
        }
    }

    /// Restricts to one task.
    #[must_use]
    pub const fn for_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Restricts to one app channel.
    #[must_use]
    pub const fn for_app(mut self, app_id: AppId) -> Self {
        self.app_id = Some(app_id);
        self
    }

    /// Returns `true` when `record` passes the filter.
    #[must_use]
    pub fn matches(&self, record: &TaskAppStatistics) -> bool {
        record.window.overlaps(&self.window)
            && self.task_id.is_none_or(|task_id| task_id == record.task_id)
            && self.app_id.is_none_or(|app_id| app_id == record.app_id)
    }
}

/// Stores and lists statistics snapshots.
///
/// Storing a snapshot for a key and window that already exists replaces it.
/// Listings are ordered by window start, then by key.
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Upserts task/app snapshots.
    async fn store_task_app(&self, records: &[TaskAppStatistics]) -> RepositoryResult<()>;

    /// Lists task/app snapshots matching `filter`.
    async fn list_task_app(
        &self,
        filter: TaskAppStatisticsFilter,
    ) -> RepositoryResult<Vec<TaskAppStatistics>>;

    /// Upserts reviewer snapshots.
    async fn store_reviewer(&self, records: &[ReviewerTaskStatistics]) -> RepositoryResult<()>;

    /// Lists reviewer snapshots overlapping `window`.
    async fn list_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<ReviewerTaskStatistics>>;
}
