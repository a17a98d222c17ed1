//! Row models for statistics queries and snapshot tables.

use super::schema::{reviewer_task_statistics, task_app_statistics};
use crate::statistics::domain::{
    AggregateRow, AggregateValue, ReviewerTaskStatistics, StatisticsWindow, TaskAppStatistics,
};
use crate::user_task::{
    adapters::postgres::models::{UserTaskRow, to_i64, to_u64},
    domain::{AppId, StaffUserId, TaskId},
    ports::{RepositoryError, RepositoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable};

/// Result row of an aggregate query: the representative user task plus the
/// aggregated columns.
#[derive(Debug, QueryableByName)]
pub struct AggregateRecord {
    #[diesel(embed)]
    pub user_task: UserTaskRow,
    #[diesel(sql_type = BigInt)]
    pub amount: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    pub total_flow: Option<i64>,
}

impl AggregateRecord {
    pub fn into_domain(self) -> RepositoryResult<AggregateRow> {
        let mut values = vec![AggregateValue::Count(to_u64(self.amount)?)];
        if let Some(flow) = self.total_flow {
            values.push(AggregateValue::Flow(to_u64(flow)?));
        }
        Ok(AggregateRow::new(self.user_task.into_domain()?, values))
    }
}

fn window_from(begin: DateTime<Utc>, end: DateTime<Utc>) -> RepositoryResult<StatisticsWindow> {
    StatisticsWindow::new(begin, end).map_err(RepositoryError::persistence)
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_app_statistics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskAppStatisticsRow {
    pub task_id: uuid::Uuid,
    pub app_id: i64,
    pub window_begin: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub received_amount: i64,
    pub completed_amount: i64,
    pub accepted_amount: i64,
    pub total_flow: i64,
}

impl TaskAppStatisticsRow {
    pub fn from_domain(record: &TaskAppStatistics) -> RepositoryResult<Self> {
        Ok(Self {
            task_id: record.task_id.into_inner(),
            app_id: to_i64(record.app_id.value())?,
            window_begin: record.window.begin(),
            window_end: record.window.end(),
            received_amount: to_i64(record.received_amount)?,
            completed_amount: to_i64(record.completed_amount)?,
            accepted_amount: to_i64(record.accepted_amount)?,
            total_flow: to_i64(record.total_flow)?,
        })
    }

    pub fn into_domain(self) -> RepositoryResult<TaskAppStatistics> {
        Ok(TaskAppStatistics {
            task_id: TaskId::from_uuid(self.task_id),
            app_id: AppId::new(to_u64(self.app_id)?).map_err(RepositoryError::persistence)?,
            window: window_from(self.window_begin, self.window_end)?,
            received_amount: to_u64(self.received_amount)?,
            completed_amount: to_u64(self.completed_amount)?,
            accepted_amount: to_u64(self.accepted_amount)?,
            total_flow: to_u64(self.total_flow)?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = reviewer_task_statistics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewerTaskStatisticsRow {
    pub reviewer_user_id: uuid::Uuid,
    pub window_begin: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub accepted_amount: i64,
    pub reviewed_amount: i64,
}

impl ReviewerTaskStatisticsRow {
    pub fn from_domain(record: &ReviewerTaskStatistics) -> RepositoryResult<Self> {
        Ok(Self {
            reviewer_user_id: record.reviewer_user_id.into_inner(),
            window_begin: record.window.begin(),
            window_end: record.window.end(),
            accepted_amount: to_i64(record.accepted_amount)?,
            reviewed_amount: to_i64(record.reviewed_amount)?,
        })
    }

    pub fn into_domain(self) -> RepositoryResult<ReviewerTaskStatistics> {
        Ok(ReviewerTaskStatistics {
            reviewer_user_id: StaffUserId::from_uuid(self.reviewer_user_id),
            window: window_from(self.window_begin, self.window_end)?,
            accepted_amount: to_u64(self.accepted_amount)?,
            reviewed_amount: to_u64(self.reviewed_amount)?,
        })
    }
}
