//! Statistics aggregation and snapshot collection.

use crate::statistics::{
    domain::{
        AggregateRow, InvalidWindow, ReviewerTaskStatistics, StatisticsWindow, TaskAppStatistics,
    },
    ports::{StatisticsRepository, TaskAppStatisticsFilter, UserTaskAggregates},
};
use crate::user_task::{
    domain::{AppId, StaffUserId, TaskId},
    ports::RepositoryError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for statistics operations.
#[derive(Debug, Error)]
pub enum StatisticsError {
    /// The requested window is empty or inverted.
    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindow),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type for statistics service operations.
pub type StatisticsResult<T> = Result<T, StatisticsError>;

/// Running tally of rows kept and skipped by one aggregation.
#[derive(Debug, Default)]
struct Tally {
    kept: usize,
    skipped: usize,
}

impl Tally {
    fn finish(&self, aggregation: &'static str, window: StatisticsWindow) {
        debug!(
            aggregation,
            %window,
            kept = self.kept,
            skipped = self.skipped,
            "aggregation finished"
        );
    }
}

fn skip_malformed(aggregation: &'static str, row: &AggregateRow, tally: &mut Tally) {
    tally.skipped = tally.skipped.saturating_add(1);
    warn!(
        aggregation,
        task_id = %row.representative.task_id(),
        app_id = row.representative.app_id().value(),
        reviewer = ?row.representative.reviewer_user_id().map(|id| id.to_string()),
        values = ?row.values,
        "skipping malformed aggregate row"
    );
}

/// Turns task/app rows into records, skipping rows `extract` cannot read.
fn task_app_records<V>(
    aggregation: &'static str,
    window: StatisticsWindow,
    rows: &[AggregateRow],
    extract: impl Fn(&AggregateRow) -> Option<V>,
    fill: impl Fn(&mut TaskAppStatistics, V),
) -> Vec<TaskAppStatistics> {
    let mut tally = Tally::default();
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(value) = extract(row) else {
            skip_malformed(aggregation, row, &mut tally);
            continue;
        };
        let user_task = &row.representative;
        let mut record = TaskAppStatistics::empty(user_task.task_id(), user_task.app_id(), window);
        fill(&mut record, value);
        records.push(record);
        tally.kept = tally.kept.saturating_add(1);
    }
    tally.finish(aggregation, window);
    records
}

/// Turns reviewer rows into records, skipping unreadable rows and rows
/// without a reviewer.
fn reviewer_records(
    aggregation: &'static str,
    window: StatisticsWindow,
    rows: &[AggregateRow],
    fill: impl Fn(&mut ReviewerTaskStatistics, u64),
) -> Vec<ReviewerTaskStatistics> {
    let mut tally = Tally::default();
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let (Some(reviewer), Some(count)) =
            (row.representative.reviewer_user_id(), row.single_count())
        else {
            skip_malformed(aggregation, row, &mut tally);
            continue;
        };
        let mut record = ReviewerTaskStatistics::empty(reviewer, window);
        fill(&mut record, count);
        records.push(record);
        tally.kept = tally.kept.saturating_add(1);
    }
    tally.finish(aggregation, window);
    records
}

fn merged_slot<'a>(
    merged: &'a mut BTreeMap<(TaskId, AppId), TaskAppStatistics>,
    record: &TaskAppStatistics,
) -> &'a mut TaskAppStatistics {
    merged
        .entry((record.task_id, record.app_id))
        .or_insert_with(|| TaskAppStatistics::empty(record.task_id, record.app_id, record.window))
}

/// Computes and stores marketplace statistics.
#[derive(Clone)]
pub struct StatisticsService<A, R>
where
    A: UserTaskAggregates,
    R: StatisticsRepository,
{
    aggregates: Arc<A>,
    snapshots: Arc<R>,
}

impl<A, R> StatisticsService<A, R>
where
    A: UserTaskAggregates,
    R: StatisticsRepository,
{
    /// Creates a new statistics service.
    #[must_use]
    pub const fn new(aggregates: Arc<A>, snapshots: Arc<R>) -> Self {
        Self {
            aggregates,
            snapshots,
        }
    }

    /// Counts receives per task and app during `window`.
    ///
    /// Only `received_amount` is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the query fails.
    pub async fn received_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        let rows = self
            .aggregates
            .received_amount_of_task_and_app(window)
            .await?;
        Ok(task_app_records(
            "received",
            window,
            &rows,
            AggregateRow::single_count,
            |record, count| record.received_amount = count,
        ))
    }

    /// Counts completions per task and app during `window`.
    ///
    /// Only `completed_amount` is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the query fails.
    pub async fn completed_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        let rows = self
            .aggregates
            .completed_amount_of_task_and_app(window)
            .await?;
        Ok(task_app_records(
            "completed",
            window,
            &rows,
            AggregateRow::single_count,
            |record, count| record.completed_amount = count,
        ))
    }

    /// Counts accepted completions and sums their flow per task and app
    /// during `window`.
    ///
    /// Only `accepted_amount` and `total_flow` are filled in.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the query fails.
    pub async fn accepted_amount_and_total_flow_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        let rows = self
            .aggregates
            .accepted_amount_and_total_flow_of_task_and_app(window)
            .await?;
        Ok(task_app_records(
            "accepted",
            window,
            &rows,
            AggregateRow::count_and_flow,
            |record, (count, flow)| {
                record.accepted_amount = count;
                record.total_flow = flow;
            },
        ))
    }

    /// Counts accepting reviews per reviewer during `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the query fails.
    pub async fn accepted_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<ReviewerTaskStatistics>> {
        let rows = self.aggregates.accepted_amount_of_reviewer(window).await?;
        Ok(reviewer_records(
            "reviewer_accepted",
            window,
            &rows,
            |record, count| record.accepted_amount = count,
        ))
    }

    /// Counts reviews of any outcome per reviewer during `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the query fails.
    pub async fn reviewed_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<ReviewerTaskStatistics>> {
        let rows = self.aggregates.reviewed_amount_of_reviewer(window).await?;
        Ok(reviewer_records(
            "reviewer_reviewed",
            window,
            &rows,
            |record, count| record.reviewed_amount = count,
        ))
    }

    /// Merges the three task/app aggregations into one record per pair and
    /// stores them as the snapshot for `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when a query or the store
    /// fails.
    pub async fn collect_task_app_statistics(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        let mut merged: BTreeMap<(TaskId, AppId), TaskAppStatistics> = BTreeMap::new();
        for record in self.received_amount_of_task_and_app(window).await? {
            merged_slot(&mut merged, &record).received_amount = record.received_amount;
        }
        for record in self.completed_amount_of_task_and_app(window).await? {
            merged_slot(&mut merged, &record).completed_amount = record.completed_amount;
        }
        for record in self
            .accepted_amount_and_total_flow_of_task_and_app(window)
            .await?
        {
            let target = merged_slot(&mut merged, &record);
            target.accepted_amount = record.accepted_amount;
            target.total_flow = record.total_flow;
        }

        let records: Vec<_> = merged.into_values().collect();
        self.snapshots.store_task_app(&records).await?;
        info!(%window, pairs = records.len(), "task/app statistics collected");
        Ok(records)
    }

    /// Merges both reviewer aggregations into one record per reviewer and
    /// stores them as the snapshot for `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when a query or the store
    /// fails.
    pub async fn collect_reviewer_statistics(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<ReviewerTaskStatistics>> {
        let mut merged: BTreeMap<StaffUserId, ReviewerTaskStatistics> = BTreeMap::new();
        for record in self.accepted_amount_of_reviewer(window).await? {
            merged
                .entry(record.reviewer_user_id)
                .or_insert_with(|| ReviewerTaskStatistics::empty(record.reviewer_user_id, window))
                .accepted_amount = record.accepted_amount;
        }
        for record in self.reviewed_amount_of_reviewer(window).await? {
            merged
                .entry(record.reviewer_user_id)
                .or_insert_with(|| ReviewerTaskStatistics::empty(record.reviewer_user_id, window))
                .reviewed_amount = record.reviewed_amount;
        }

        let records: Vec<_> = merged.into_values().collect();
        self.snapshots.store_reviewer(&records).await?;
        info!(%window, reviewers = records.len(), "reviewer statistics collected");
        Ok(records)
    }

    /// Lists stored task/app snapshots overlapping `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the lookup fails.
    pub async fn list(&self, window: StatisticsWindow) -> StatisticsResult<Vec<TaskAppStatistics>> {
        self.list_matching(TaskAppStatisticsFilter::overlapping(window))
            .await
    }

    /// Lists stored snapshots of one app channel overlapping `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the lookup fails.
    pub async fn list_for_app(
        &self,
        app_id: AppId,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        self.list_matching(TaskAppStatisticsFilter::overlapping(window).for_app(app_id))
            .await
    }

    /// Lists stored snapshots of one task overlapping `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the lookup fails.
    pub async fn list_for_task(
        &self,
        task_id: TaskId,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        self.list_matching(TaskAppStatisticsFilter::overlapping(window).for_task(task_id))
            .await
    }

    /// Lists stored snapshots of one task through one app channel
    /// overlapping `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the lookup fails.
    pub async fn list_for_task_app(
        &self,
        task_id: TaskId,
        app_id: AppId,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        let filter = TaskAppStatisticsFilter::overlapping(window)
            .for_task(task_id)
            .for_app(app_id);
        self.list_matching(filter).await
    }

    /// Lists stored reviewer snapshots overlapping `window`.
    ///
    /// # Errors
    ///
    /// Returns [`StatisticsError::Repository`] when the lookup fails.
    pub async fn list_reviewer_statistics(
        &self,
        window: StatisticsWindow,
    ) -> StatisticsResult<Vec<ReviewerTaskStatistics>> {
        Ok(self.snapshots.list_reviewer(window).await?)
    }

    async fn list_matching(
        &self,
        filter: TaskAppStatisticsFilter,
    ) -> StatisticsResult<Vec<TaskAppStatistics>> {
        Ok(self.snapshots.list_task_app(filter).await?)
    }
}
