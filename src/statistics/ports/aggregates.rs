//! Grouped queries over user tasks.

use crate::statistics::domain::{AggregateRow, StatisticsWindow};
use crate::user_task::ports::RepositoryResult;
use async_trait::async_trait;

/// Aggregate queries backing the statistics service.
///
/// Task/app queries group by `(task_id, app_id)` and reviewer queries by
/// `reviewer_user_id`; each row carries one user task of its group as the
/// representative.
#[async_trait]
pub trait UserTaskAggregates: Send + Sync {
    /// Counts user tasks whose `created_at` falls in `window`.
    ///
    /// Rows hold `[Count]`.
    async fn received_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>>;

    /// Counts user tasks whose `completed_at` falls in `window`.
    ///
    /// Rows hold `[Count]`.
    async fn completed_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>>;

    /// Counts accepted user tasks whose `completed_at` falls in `window` and
    /// sums their task's flow.
    ///
    /// Rows hold `[Count, Flow]`.
    async fn accepted_amount_and_total_flow_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>>;

    /// Counts accepted user tasks whose `reviewed_at` falls in `window`.
    ///
    /// Rows hold `[Count]`.
    async fn accepted_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>>;

    /// Counts accepted or rejected user tasks whose `reviewed_at` falls in
    /// `window`.
    ///
    /// Rows hold `[Count]`.
    async fn reviewed_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>>;
}
