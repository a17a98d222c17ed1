//! In-memory statistics snapshot store.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::statistics::{
    domain::{ReviewerTaskStatistics, StatisticsWindow, TaskAppStatistics},
    ports::{StatisticsRepository, TaskAppStatisticsFilter},
};
use crate::user_task::{
    domain::{AppId, StaffUserId, TaskId},
    ports::{RepositoryError, RepositoryResult},
};

type TaskAppKey = (StatisticsWindow, TaskId, AppId);
type ReviewerKey = (StatisticsWindow, StaffUserId);

#[derive(Debug, Default)]
struct Snapshots {
    task_app: BTreeMap<TaskAppKey, TaskAppStatistics>,
    reviewer: BTreeMap<ReviewerKey, ReviewerTaskStatistics>,
}

/// Thread-safe in-memory statistics repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatisticsRepository {
    snapshots: Arc<RwLock<Snapshots>>,
}

impl InMemoryStatisticsRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl StatisticsRepository for InMemoryStatisticsRepository {
    async fn store_task_app(&self, records: &[TaskAppStatistics]) -> RepositoryResult<()> {
        let mut snapshots = self.snapshots.write().map_err(poisoned)?;
        for record in records {
            snapshots
                .task_app
                .insert((record.window, record.task_id, record.app_id), *record);
        }
        Ok(())
    }

    async fn list_task_app(
        &self,
        filter: TaskAppStatisticsFilter,
    ) -> RepositoryResult<Vec<TaskAppStatistics>> {
        let snapshots = self.snapshots.read().map_err(poisoned)?;
        Ok(snapshots
            .task_app
            .values()
            .filter(|record| filter.matches(record))
            .copied()
            .collect())
    }

    async fn store_reviewer(&self, records: &[ReviewerTaskStatistics]) -> RepositoryResult<()> {
        let mut snapshots = self.snapshots.write().map_err(poisoned)?;
        for record in records {
            snapshots
                .reviewer
                .insert((record.window, record.reviewer_user_id), *record);
        }
        Ok(())
    }

    async fn list_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<ReviewerTaskStatistics>> {
        let snapshots = self.snapshots.read().map_err(poisoned)?;
        Ok(snapshots
            .reviewer
            .values()
            .filter(|record| record.window.overlaps(&window))
            .copied()
            .collect())
    }
}
