//! `PostgreSQL` repositories for lifecycle storage.

use super::{
    models::{StaffRow, TaskRow, UserTaskLogRow, UserTaskRow, to_i64, to_u64},
    schema::{staff_users, tasks, user_task_logs, user_tasks},
};
use crate::config::DatabaseConfig;
use crate::user_task::{
    domain::{
        AppId, AppUserId, StaffRole, StaffStatus, StaffUser, StaffUserId, Task, TaskId, UserTask,
        UserTaskId, UserTaskLog,
    },
    ports::{
        RepositoryError, RepositoryResult, StaffRepository, TaskRepository, TaskUpdate,
        TransitionCommit, UserTaskRepository, UserTaskWrite,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by marketplace adapters.
pub type MarketPgPool = Pool<ConnectionManager<PgConnection>>;

/// Raised when a pool is requested without a configured URL.
#[derive(Debug, thiserror::Error)]
#[error("database.url is not configured")]
struct MissingDatabaseUrl;

/// Builds a connection pool from configuration.
///
/// # Errors
///
/// Returns [`RepositoryError::Persistence`] when no URL is configured or the
/// pool cannot be created.
pub fn build_pool(config: &DatabaseConfig) -> RepositoryResult<MarketPgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| RepositoryError::persistence(MissingDatabaseUrl))?;
    Pool::builder()
        .max_size(config.pool_size)
        .build(ConnectionManager::<PgConnection>::new(url))
        .map_err(RepositoryError::persistence)
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// Runs blocking Diesel work on the blocking thread pool.
pub(crate) async fn run_blocking<F, T>(pool: &MarketPgPool, f: F) -> RepositoryResult<T>
where
    F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool.get().map_err(RepositoryError::persistence)?;
        f(&mut connection)
    })
    .await
    .map_err(RepositoryError::persistence)?
}

fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// `PostgreSQL`-backed task, user-task, and audit-log store.
#[derive(Debug, Clone)]
pub struct PostgresUserTaskStore {
    pool: MarketPgPool,
}

impl PostgresUserTaskStore {
    /// Creates a store from a connection pool.
    #[must_use]
    pub const fn new(pool: MarketPgPool) -> Self {
        Self { pool }
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &MarketPgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for PostgresUserTaskStore {
    async fn store(&self, task: &Task) -> RepositoryResult<()> {
        let task_id = task.id();
        let row = TaskRow::from_domain(task)?;
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        RepositoryError::DuplicateTask(task_id)
                    } else {
                        RepositoryError::persistence(err)
                    }
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> RepositoryResult<Option<Task>> {
        run_blocking(&self.pool, move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(TaskRow::into_domain).transpose()
        })
        .await
    }
}

fn apply_task_update(connection: &mut PgConnection, update: &TaskUpdate) -> RepositoryResult<()> {
    let row = TaskRow::from_domain(&update.task)?;
    let expected_version = to_i64(update.expected_version)?;
    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(row.id))
            .filter(tasks::version.eq(expected_version)),
    )
    .set((
        tasks::left_amount.eq(row.left_amount),
        tasks::completed_amount.eq(row.completed_amount),
        tasks::accepted_amount.eq(row.accepted_amount),
        tasks::version.eq(row.version),
    ))
    .execute(connection)?;

    if updated == 0 {
        return Err(RepositoryError::StaleTask {
            task_id: update.task.id(),
            expected_version: update.expected_version,
        });
    }
    Ok(())
}

fn write_user_task(
    connection: &mut PgConnection,
    user_task: &UserTask,
    write: UserTaskWrite,
) -> RepositoryResult<()> {
    let user_task_id = user_task.id();
    let row = UserTaskRow::from_domain(user_task)?;
    match write {
        UserTaskWrite::Insert => {
            diesel::insert_into(user_tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        RepositoryError::DuplicateUserTask(user_task_id)
                    } else {
                        RepositoryError::persistence(err)
                    }
                })?;
        }
        UserTaskWrite::Update { expected_status } => {
            let updated = diesel::update(
                user_tasks::table
                    .filter(user_tasks::id.eq(row.id))
                    .filter(user_tasks::status.eq(expected_status.as_str())),
            )
            .set(&row)
            .execute(connection)?;
            if updated == 0 {
                let exists: i64 = user_tasks::table
                    .filter(user_tasks::id.eq(row.id))
                    .count()
                    .get_result(connection)?;
                return Err(if exists == 0 {
                    RepositoryError::UserTaskNotFound(user_task_id)
                } else {
                    RepositoryError::StaleUserTask {
                        user_task_id,
                        expected_status,
                    }
                });
            }
        }
    }
    Ok(())
}

fn into_logs(rows: Vec<UserTaskLogRow>) -> RepositoryResult<Vec<UserTaskLog>> {
    rows.into_iter().map(UserTaskLogRow::into_domain).collect()
}

#[async_trait]
impl UserTaskRepository for PostgresUserTaskStore {
    async fn find_by_id(&self, id: UserTaskId) -> RepositoryResult<Option<UserTask>> {
        run_blocking(&self.pool, move |connection| {
            let row = user_tasks::table
                .find(id.into_inner())
                .select(UserTaskRow::as_select())
                .first::<UserTaskRow>(connection)
                .optional()?;
            row.map(UserTaskRow::into_domain).transpose()
        })
        .await
    }

    async fn find_latest_by_channel_user_task(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<UserTask>> {
        let app = to_i64(app_id.value())?;
        let app_user = app_user_id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = user_tasks::table
                .filter(user_tasks::app_id.eq(app))
                .filter(user_tasks::app_user_id.eq(app_user))
                .filter(user_tasks::task_id.eq(task_id.into_inner()))
                .order((user_tasks::created_at.desc(), user_tasks::id.desc()))
                .select(UserTaskRow::as_select())
                .first::<UserTaskRow>(connection)
                .optional()?;
            row.map(UserTaskRow::into_domain).transpose()
        })
        .await
    }

    async fn count_by_channel_user_task(
        &self,
        app_id: AppId,
        app_user_id: &AppUserId,
        task_id: TaskId,
    ) -> RepositoryResult<u64> {
        let app = to_i64(app_id.value())?;
        let app_user = app_user_id.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let count: i64 = user_tasks::table
                .filter(user_tasks::app_id.eq(app))
                .filter(user_tasks::app_user_id.eq(app_user))
                .filter(user_tasks::task_id.eq(task_id.into_inner()))
                .count()
                .get_result(connection)?;
            to_u64(count)
        })
        .await
    }

    async fn logs_for_user_task(&self, id: UserTaskId) -> RepositoryResult<Vec<UserTaskLog>> {
        run_blocking(&self.pool, move |connection| {
            let rows = user_task_logs::table
                .filter(user_task_logs::user_task_id.eq(id.into_inner()))
                .order(user_task_logs::seq.asc())
                .select(UserTaskLogRow::as_select())
                .load::<UserTaskLogRow>(connection)?;
            into_logs(rows)
        })
        .await
    }

    async fn logs_for_task(&self, task_id: TaskId) -> RepositoryResult<Vec<UserTaskLog>> {
        run_blocking(&self.pool, move |connection| {
            let rows = user_task_logs::table
                .filter(user_task_logs::task_id.eq(task_id.into_inner()))
                .order(user_task_logs::seq.asc())
                .select(UserTaskLogRow::as_select())
                .load::<UserTaskLogRow>(connection)?;
            into_logs(rows)
        })
        .await
    }

    async fn commit(&self, commit: &TransitionCommit) -> RepositoryResult<()> {
        let owned = commit.clone();
        let log_row = UserTaskLogRow::from_domain(&commit.log)?;
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                if let Some(update) = &owned.task_update {
                    apply_task_update(tx, update)?;
                }
                write_user_task(tx, &owned.user_task, owned.user_task_write)?;
                diesel::insert_into(user_task_logs::table)
                    .values(&log_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }
}

/// `PostgreSQL`-backed staff repository.
#[derive(Debug, Clone)]
pub struct PostgresStaffRepository {
    pool: MarketPgPool,
}

impl PostgresStaffRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: MarketPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for PostgresStaffRepository {
    async fn store(&self, staff: &StaffUser) -> RepositoryResult<()> {
        let staff_id = staff.id();
        let row = StaffRow::from_domain(staff);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(staff_users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        RepositoryError::DuplicateStaffUser(staff_id)
                    } else {
                        RepositoryError::persistence(err)
                    }
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: StaffUserId) -> RepositoryResult<Option<StaffUser>> {
        run_blocking(&self.pool, move |connection| {
            let row = staff_users::table
                .find(id.into_inner())
                .select(StaffRow::as_select())
                .first::<StaffRow>(connection)
                .optional()?;
            row.map(StaffRow::into_domain).transpose()
        })
        .await
    }

    async fn find_one_random_active(&self, role: StaffRole) -> RepositoryResult<Option<StaffUser>> {
        run_blocking(&self.pool, move |connection| {
            let row = diesel::sql_query(concat!(
                "SELECT id, name, role, status FROM staff_users ",
                "WHERE role = $1 AND status = $2 ",
                "ORDER BY random() LIMIT 1",
            ))
            .bind::<diesel::sql_types::Text, _>(role.as_str())
            .bind::<diesel::sql_types::Text, _>(StaffStatus::Active.as_str())
            .get_result::<StaffRow>(connection)
            .optional()?;
            row.map(StaffRow::into_domain).transpose()
        })
        .await
    }
}
