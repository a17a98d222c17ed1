//! Diesel row models and their conversions to domain entities.

use super::schema::{staff_users, tasks, user_task_logs, user_tasks};
use crate::user_task::{
    domain::{
        AppId, AppUserId, Operator, PersistedTaskData, PersistedUserTaskData,
        PersistedUserTaskLogData, StaffRole, StaffStatus, StaffUser, StaffUserId, Task, TaskId,
        TaskLimits, UserTask, UserTaskId, UserTaskLog, UserTaskLogId, UserTaskStatus,
    },
    ports::{RepositoryError, RepositoryResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Task row, used for reads and inserts.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: uuid::Uuid,
    pub title: String,
    pub flow: i64,
    pub total_amount: i64,
    pub each_person_limit: i32,
    pub recycle_days_limit: i32,
    pub review_period: Option<i64>,
    pub left_amount: i64,
    pub completed_amount: i64,
    pub accepted_amount: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// User-task row, used for reads, inserts, and updates.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct UserTaskRow {
    pub id: uuid::Uuid,
    pub app_id: i64,
    pub app_user_id: String,
    pub task_id: uuid::Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub review_end_at: Option<DateTime<Utc>>,
    pub reviewer_user_id: Option<uuid::Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Audit-log row; `seq` is assigned by the database.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_task_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserTaskLogRow {
    pub id: uuid::Uuid,
    pub user_task_id: uuid::Uuid,
    pub task_id: uuid::Uuid,
    pub operator_app_id: Option<i64>,
    pub operator_app_user_id: Option<String>,
    pub operator_user_id: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
    pub from_status: String,
    pub to_status: String,
}

/// Staff row.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Insertable)]
#[diesel(table_name = staff_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StaffRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub role: String,
    pub status: String,
}

pub fn to_i64(value: u64) -> RepositoryResult<i64> {
    i64::try_from(value).map_err(RepositoryError::persistence)
}

pub fn to_u64(value: i64) -> RepositoryResult<u64> {
    u64::try_from(value).map_err(RepositoryError::persistence)
}

fn to_i32(value: u32) -> RepositoryResult<i32> {
    i32::try_from(value).map_err(RepositoryError::persistence)
}

fn to_u32(value: i32) -> RepositoryResult<u32> {
    u32::try_from(value).map_err(RepositoryError::persistence)
}

fn app_id_from(value: i64) -> RepositoryResult<AppId> {
    AppId::new(to_u64(value)?).map_err(RepositoryError::persistence)
}

fn status_from(value: &str) -> RepositoryResult<UserTaskStatus> {
    UserTaskStatus::try_from(value).map_err(RepositoryError::persistence)
}

impl TaskRow {
    pub fn from_domain(task: &Task) -> RepositoryResult<Self> {
        let limits = task.limits();
        Ok(Self {
            id: task.id().into_inner(),
            title: task.title().to_owned(),
            flow: to_i64(task.flow())?,
            total_amount: to_i64(task.total_amount())?,
            each_person_limit: to_i32(limits.each_person_limit)?,
            recycle_days_limit: to_i32(limits.recycle_days_limit)?,
            review_period: limits.review_period.map(to_i64).transpose()?,
            left_amount: to_i64(task.left_amount())?,
            completed_amount: to_i64(task.completed_amount())?,
            accepted_amount: to_i64(task.accepted_amount())?,
            version: to_i64(task.version())?,
            created_at: task.created_at(),
        })
    }

    pub fn into_domain(self) -> RepositoryResult<Task> {
        let limits = TaskLimits {
            each_person_limit: to_u32(self.each_person_limit)?,
            recycle_days_limit: to_u32(self.recycle_days_limit)?,
            review_period: self.review_period.map(to_u64).transpose()?,
        };
        Task::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(self.id),
            title: self.title,
            flow: to_u64(self.flow)?,
            total_amount: to_u64(self.total_amount)?,
            limits,
            left_amount: to_u64(self.left_amount)?,
            completed_amount: to_u64(self.completed_amount)?,
            accepted_amount: to_u64(self.accepted_amount)?,
            version: to_u64(self.version)?,
            created_at: self.created_at,
        })
        .map_err(RepositoryError::persistence)
    }
}

impl UserTaskRow {
    pub fn from_domain(user_task: &UserTask) -> RepositoryResult<Self> {
        Ok(Self {
            id: user_task.id().into_inner(),
            app_id: to_i64(user_task.app_id().value())?,
            app_user_id: user_task.app_user_id().as_str().to_owned(),
            task_id: user_task.task_id().into_inner(),
            status: user_task.status().as_str().to_owned(),
            created_at: user_task.created_at(),
            completed_at: user_task.completed_at(),
            review_end_at: user_task.review_end_at(),
            reviewer_user_id: user_task.reviewer_user_id().map(StaffUserId::into_inner),
            reviewed_at: user_task.reviewed_at(),
        })
    }

    pub fn into_domain(self) -> RepositoryResult<UserTask> {
        Ok(UserTask::from_persisted(PersistedUserTaskData {
            id: UserTaskId::from_uuid(self.id),
            app_id: app_id_from(self.app_id)?,
            app_user_id: AppUserId::new(self.app_user_id).map_err(RepositoryError::persistence)?,
            task_id: TaskId::from_uuid(self.task_id),
            status: status_from(&self.status)?,
            created_at: self.created_at,
            completed_at: self.completed_at,
            review_end_at: self.review_end_at,
            reviewer_user_id: self.reviewer_user_id.map(StaffUserId::from_uuid),
            reviewed_at: self.reviewed_at,
        }))
    }
}

/// Raised when a stored audit record names no actor or both kinds.
#[derive(Debug, thiserror::Error)]
#[error("audit record {0} has an ambiguous operator")]
pub struct AmbiguousOperator(uuid::Uuid);

impl UserTaskLogRow {
    pub fn from_domain(log: &UserTaskLog) -> RepositoryResult<Self> {
        let (operator_app_id, operator_app_user_id, operator_user_id) = match log.operator() {
            Operator::EndUser {
                app_id,
                app_user_id,
            } => (
                Some(to_i64(app_id.value())?),
                Some(app_user_id.as_str().to_owned()),
                None,
            ),
            Operator::Staff { user_id } => (None, None, Some(user_id.into_inner())),
        };
        Ok(Self {
            id: log.id().into_inner(),
            user_task_id: log.user_task_id().into_inner(),
            task_id: log.task_id().into_inner(),
            operator_app_id,
            operator_app_user_id,
            operator_user_id,
            created_at: log.created_at(),
            from_status: log.from_status().as_str().to_owned(),
            to_status: log.to_status().as_str().to_owned(),
        })
    }

    pub fn into_domain(self) -> RepositoryResult<UserTaskLog> {
        let operator = match (
            self.operator_app_id,
            self.operator_app_user_id,
            self.operator_user_id,
        ) {
            (Some(app_id), Some(app_user_id), None) => Operator::EndUser {
                app_id: app_id_from(app_id)?,
                app_user_id: AppUserId::new(app_user_id).map_err(RepositoryError::persistence)?,
            },
            (None, None, Some(user_id)) => Operator::Staff {
                user_id: StaffUserId::from_uuid(user_id),
            },
            _ => return Err(RepositoryError::persistence(AmbiguousOperator(self.id))),
        };
        Ok(UserTaskLog::from_persisted(PersistedUserTaskLogData {
            id: UserTaskLogId::from_uuid(self.id),
            user_task_id: UserTaskId::from_uuid(self.user_task_id),
            task_id: TaskId::from_uuid(self.task_id),
            operator,
            created_at: self.created_at,
            from_status: status_from(&self.from_status)?,
            to_status: status_from(&self.to_status)?,
        }))
    }
}

impl StaffRow {
    pub fn from_domain(staff: &StaffUser) -> Self {
        Self {
            id: staff.id().into_inner(),
            name: staff.name().to_owned(),
            role: staff.role().as_str().to_owned(),
            status: staff.status().as_str().to_owned(),
        }
    }

    pub fn into_domain(self) -> RepositoryResult<StaffUser> {
        let role = StaffRole::try_from(self.role.as_str()).map_err(RepositoryError::persistence)?;
        let status =
            StaffStatus::try_from(self.status.as_str()).map_err(RepositoryError::persistence)?;
        Ok(StaffUser::from_persisted(
            StaffUserId::from_uuid(self.id),
            self.name,
            role,
            status,
        ))
    }
}
