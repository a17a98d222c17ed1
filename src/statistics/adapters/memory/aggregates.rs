//! Aggregate queries over the in-memory user-task store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::statistics::{
    domain::{AggregateRow, AggregateValue, StatisticsWindow},
    ports::UserTaskAggregates,
};
use crate::user_task::{
    adapters::memory::{InMemoryUserTaskState, InMemoryUserTaskStore},
    domain::{AppId, StaffUserId, Task, TaskId, UserTask, UserTaskStatus},
    ports::RepositoryResult,
};

fn task_app_key(user_task: &UserTask) -> (TaskId, AppId) {
    (user_task.task_id(), user_task.app_id())
}

fn reviewer_key(user_task: &UserTask) -> Option<StaffUserId> {
    user_task.reviewer_user_id()
}

fn in_window(instant: Option<DateTime<Utc>>, window: StatisticsWindow) -> bool {
    instant.is_some_and(|at| window.contains(at))
}

fn group<'a, K: Ord>(
    members: impl Iterator<Item = &'a UserTask>,
    key: impl Fn(&UserTask) -> K,
) -> BTreeMap<K, Vec<&'a UserTask>> {
    let mut groups: BTreeMap<K, Vec<&'a UserTask>> = BTreeMap::new();
    for user_task in members {
        groups.entry(key(user_task)).or_default().push(user_task);
    }
    groups
}

/// Earliest-received member stands in for the group.
fn representative<'a>(members: &[&'a UserTask]) -> Option<&'a UserTask> {
    members
        .iter()
        .copied()
        .min_by_key(|user_task| (user_task.created_at(), user_task.id()))
}

fn count_of(members: &[&UserTask]) -> u64 {
    u64::try_from(members.len()).unwrap_or(u64::MAX)
}

fn count_rows<K: Ord>(
    groups: BTreeMap<K, Vec<&UserTask>>,
    values: impl Fn(&[&UserTask]) -> Vec<AggregateValue>,
) -> Vec<AggregateRow> {
    groups
        .into_values()
        .filter_map(|members| {
            representative(&members)
                .map(|first| AggregateRow::new(first.clone(), values(&members)))
        })
        .collect()
}

fn single_count(members: &[&UserTask]) -> Vec<AggregateValue> {
    vec![AggregateValue::Count(count_of(members))]
}

fn flow_of(state: &InMemoryUserTaskState, members: &[&UserTask]) -> u64 {
    members
        .iter()
        .map(|user_task| state.tasks.get(&user_task.task_id()).map_or(0, Task::flow))
        .fold(0_u64, u64::saturating_add)
}

#[async_trait]
impl UserTaskAggregates for InMemoryUserTaskStore {
    async fn received_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let state = self.read()?;
        let matching = state
            .user_tasks
            .values()
            .filter(|user_task| window.contains(user_task.created_at()));
        Ok(count_rows(group(matching, task_app_key), single_count))
    }

    async fn completed_amount_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let state = self.read()?;
        let matching = state
            .user_tasks
            .values()
            .filter(|user_task| in_window(user_task.completed_at(), window));
        Ok(count_rows(group(matching, task_app_key), single_count))
    }

    async fn accepted_amount_and_total_flow_of_task_and_app(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let state = self.read()?;
        let matching = state.user_tasks.values().filter(|user_task| {
            user_task.status() == UserTaskStatus::Accepted
                && in_window(user_task.completed_at(), window)
        });
        Ok(count_rows(group(matching, task_app_key), |members| {
            vec![
                AggregateValue::Count(count_of(members)),
                AggregateValue::Flow(flow_of(&state, members)),
            ]
        }))
    }

    async fn accepted_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let state = self.read()?;
        let matching = state.user_tasks.values().filter(|user_task| {
            user_task.status() == UserTaskStatus::Accepted
                && in_window(user_task.reviewed_at(), window)
        });
        Ok(count_rows(group(matching, reviewer_key), single_count))
    }

    async fn reviewed_amount_of_reviewer(
        &self,
        window: StatisticsWindow,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let state = self.read()?;
        let matching = state.user_tasks.values().filter(|user_task| {
            user_task.status().is_review_outcome() && in_window(user_task.reviewed_at(), window)
        });
        Ok(count_rows(group(matching, reviewer_key), single_count))
    }
}
