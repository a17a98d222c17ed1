//! `PostgreSQL` statistics snapshot store.

use super::models::{ReviewerTaskStatisticsRow, TaskAppStatisticsRow};
use super::schema::{reviewer_task_statistics, task_app_statistics};
use crate::statistics::{
    domain::{ReviewerTaskStatistics, StatisticsWindow, TaskAppStatistics},
    ports::{StatisticsRepository, TaskAppStatisticsFilter},
};
use crate::user_task::{
    adapters::postgres::{MarketPgPool, models::to_i64, run_blocking},
    ports::RepositoryResult,
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// `PostgreSQL`-backed statistics repository.
#[derive(Debug, Clone)]
pub struct PostgresStatisticsRepository {
    pool: MarketPgPool,
}

impl PostgresStatisticsRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: MarketPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatisticsRepository for PostgresStatisticsRepository {
    async fn store_task_app(&self, records: &[TaskAppStatistics]) -> RepositoryResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = records
            .iter()
            .map(TaskAppStatisticsRow::from_domain)
            .collect::<RepositoryResult<Vec<_>>>()?;
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(task_app_statistics::table)
                .values(&rows)
                .on_conflict((
                    task_app_statistics::task_id,
                    task_app_statistics::app_id,
                    task_app_statistics::window_begin,
                    task_app_statistics::window_end,
                ))
                .do_update()
                .set((
                    task_app_statistics::received_amount
                        .eq(excluded(task_app_statistics::received_amount)),
                    task_app_statistics::completed_amount
                        .eq(excluded(task_app_statistics::completed_amount)),
                    task_app_statistics::accepted_amount
                        .eq(excluded(task_app_statistics::accepted_amount)),
                    task_app_statistics::total_flow.eq(excluded(task_app_statistics::total_flow)),
                ))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn list_task_app(
        &self,
        filter: TaskAppStatisticsFilter,
    ) -> RepositoryResult<Vec<TaskAppStatistics>> {
        let app_id = filter
            .app_id
            .map(|app| to_i64(app.value()))
            .transpose()?;
        run_blocking(&self.pool, move |connection| {
            let mut query = task_app_statistics::table
                .filter(task_app_statistics::window_begin.lt(filter.window.end()))
                .filter(task_app_statistics::window_end.gt(filter.window.begin()))
                .select(TaskAppStatisticsRow::as_select())
                .order((
                    task_app_statistics::window_begin.asc(),
                    task_app_statistics::window_end.asc(),
                    task_app_statistics::task_id.asc(),
                    task_app_statistics::app_id.asc(),
                ))
                .into_boxed();
            if let Some(task_id) = filter.task_id {
                query = query.filter(task_app_statistics::task_id.eq(task_id.into_inner()));
            }
            if let Some(app) = app_id {
                query = query.filter(task_app_statistics::app_id.eq(app));
            }
            query
                .load::<TaskAppStatisticsRow>(connection)?
                .into_iter()
                .map(TaskAppStatisticsRow::into_domain)
                .collect()
        })
        .await
    }

    async fn store_reviewer(&self, records: &[ReviewerTaskStatistics]) -> RepositoryResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let rows = records
            .iter()
            .map(ReviewerTaskStatisticsRow::from_domain)
            .collect::<RepositoryResult<Vec<_>>>()?;
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(reviewer_task_statistics::table)
                .values(&rows)
                .on_conflict((
                    reviewer_task_statistics::reviewer_user_id,
                    reviewer_task_statistics::window_begin,
                    reviewer_task_statistics::window_end,
                ))
                .do_update()
                .set((
                    reviewer_task_statistics::accepted_amount
                        .eq(excluded(reviewer_task_statistics::accepted_amount)),
                    reviewer_task_statistics::reviewed_amount
                        .eq(excluded(reviewer_task_statistics::reviewed_amount)),
                ))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn list_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<ReviewerTaskStatistics>> {
        run_blocking(&self.pool, move |connection| {
            reviewer_task_statistics::table
                .filter(reviewer_task_statistics::window_begin.lt(window.end()))
                .filter(reviewer_task_statistics::window_end.gt(window.begin()))
                .order((
                    reviewer_task_statistics::window_begin.asc(),
                    reviewer_task_statistics::window_end.asc(),
                    reviewer_task_statistics::reviewer_user_id.asc(),
                ))
                .select(ReviewerTaskStatisticsRow::as_select())
                .load::<ReviewerTaskStatisticsRow>(connection)?
                .into_iter()
                .map(ReviewerTaskStatisticsRow::into_domain)
                .collect()
        })
        .await
    }
}
