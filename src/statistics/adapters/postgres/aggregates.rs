//! Aggregate queries over `user_tasks`.
//!
//! Each query keeps one row per group with `DISTINCT ON`, taking the
//! earliest-received user task as the representative, while window functions
//! carry the group totals onto that row.

use super::models::AggregateRecord;
use crate::statistics::{
    domain::{AggregateRow, StatisticsWindow},
    ports::UserTaskAggregates,
};
use crate::user_task::{
    adapters::postgres::{PostgresUserTaskStore, run_blocking},
    domain::UserTaskStatus,
    ports::RepositoryResult,
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{Array, Text, Timestamptz};

const USER_TASK_COLUMNS: &str = "ut.id, ut.app_id, ut.app_user_id, ut.task_id, ut.status, \
     ut.created_at, ut.completed_at, ut.review_end_at, ut.reviewer_user_id, ut.reviewed_at";

/// Grouping applied by an aggregate query.
#[derive(Debug, Clone, Copy)]
enum Grouping {
    TaskApp,
    Reviewer,
}

impl Grouping {
    const fn columns(self) -> &'static str {
        match self {
            Self::TaskApp => "ut.task_id, ut.app_id",
            Self::Reviewer => "ut.reviewer_user_id",
        }
    }
}

/// Shape of one aggregate query.
#[derive(Debug, Clone, Copy)]
struct AggregateQuery {
    grouping: Grouping,
    /// Timestamp column compared against the window.
    time_column: &'static str,
    /// Whether only rows in the bound statuses count.
    filter_status: bool,
    /// Whether to sum task flow.
    with_flow: bool,
}

impl AggregateQuery {
    fn sql(self) -> String {
        let group = self.grouping.columns();
        let flow = if self.with_flow {
            format!("CAST(SUM(t.flow) OVER (PARTITION BY {group}) AS BIGINT)")
        } else {
            "CAST(NULL AS BIGINT)".to_owned()
        };
        let join = if self.with_flow {
            " JOIN tasks t ON t.id = ut.task_id"
        } else {
            ""
        };
        let status = if self.filter_status {
            " AND ut.status = ANY($3)"
        } else {
            ""
        };
        let time = self.time_column;
        format!(
            "SELECT DISTINCT ON ({group}) {USER_TASK_COLUMNS}, \
             COUNT(*) OVER (PARTITION BY {group}) AS amount, {flow} AS total_flow \
             FROM user_tasks ut{join} \
             WHERE ut.{time} >= $1 AND ut.{time} < $2{status} \
             ORDER BY {group}, ut.created_at, ut.id"
        )
    }
}

async fn run(
    store: &PostgresUserTaskStore,
    query: AggregateQuery,
    window: StatisticsWindow,
    statuses: &[UserTaskStatus],
) -> RepositoryResult<Vec<AggregateRow>> {
    let sql = query.sql();
    let status_values: Vec<String> = statuses
        .iter()
        .map(|status| status.as_str().to_owned())
        .collect();
    run_blocking(store.pool(), move |connection| {
        let base = diesel::sql_query(sql)
            .bind::<Timestamptz, _>(window.begin())
            .bind::<Timestamptz, _>(window.end());
        let records = if query.filter_status {
            base.bind::<Array<Text>, _>(status_values)
                .load::<AggregateRecord>(connection)?
        } else {
            base.load::<AggregateRecord>(connection)?
        };
        records
            .into_iter()
            .map(AggregateRecord::into_domain)
            .collect()
    })
    .await
}

#[async_trait]
impl UserTaskAggregates for PostgresUserTaskStore {
    async fn received_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let query = AggregateQuery {
            grouping: Grouping::TaskApp,
            time_column: "created_at",
            filter_status: false,
            with_flow: false,
        };
        run(self, query, window, &[]).await
    }

    async fn completed_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let query = AggregateQuery {
            grouping: Grouping::TaskApp,
            time_column: "completed_at",
            filter_status: false,
            with_flow: false,
        };
        run(self, query, window, &[]).await
    }

    async fn accepted_amount_and_total_flow_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let query = AggregateQuery {
            grouping: Grouping::TaskApp,
            time_column: "completed_at",
            filter_status: true,
            with_flow: true,
        };
        run(self, query, window, &[UserTaskStatus::Accepted]).await
    }

    async fn accepted_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let query = AggregateQuery {
            grouping: Grouping::Reviewer,
            time_column: "reviewed_at",
            filter_status: true,
            with_flow: false,
        };
        run(self, query, window, &[UserTaskStatus::Accepted]).await
    }

    async fn reviewed_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let query = AggregateQuery {
            grouping: Grouping::Reviewer,
            time_column: "reviewed_at",
            filter_status: true,
            with_flow: false,
        };
        let statuses = [UserTaskStatus::Accepted, UserTaskStatus::Rejected];
        run(self, query, window, &statuses).await
    }
}
