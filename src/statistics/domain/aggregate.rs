//! Raw grouped rows returned by aggregate queries.

use crate::user_task::domain::UserTask;

/// One aggregated value in an [`AggregateRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateValue {
    /// Number of user tasks in the group.
    Count(u64),
    /// Sum of task flow over the group.
    Flow(u64),
}

/// A grouped aggregate: one user task standing in for the group key, plus the
/// aggregated values.
///
/// Task/app aggregations read the key from the representative's `task_id` and
/// `app_id`; reviewer aggregations read `reviewer_user_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    /// User task carrying the grouping key.
    pub representative: UserTask,
    /// Aggregated values, in query order.
    pub values: Vec<AggregateValue>,
}

impl AggregateRow {
    /// Creates a row.
    #[must_use]
    pub const fn new(representative: UserTask, values: Vec<AggregateValue>) -> Self {
        Self {
            representative,
            values,
        }
    }

    /// Returns the count when the row holds exactly one count.
    #[must_use]
    pub fn single_count(&self) -> Option<u64> {
        match self.values.as_slice() {
            [AggregateValue::Count(count)] => Some(*count),
            _ => None,
        }
    }

    /// Returns `(count, flow)` when the row holds exactly a count followed by
    /// a flow sum.
    #[must_use]
    pub fn count_and_flow(&self) -> Option<(u64, u64)> {
        match self.values.as_slice() {
            [AggregateValue::Count(count), AggregateValue::Flow(flow)] => Some((*count, *flow)),
            _ => None,
        }
    }
}
