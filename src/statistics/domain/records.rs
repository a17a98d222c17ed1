//! Statistics snapshots per task/app pair and per reviewer.

use super::StatisticsWindow;
use crate::user_task::domain::{AppId, StaffUserId, TaskId};
use serde::{Deserialize, Serialize};

/// Activity of one task through one app channel during a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAppStatistics {
    /// Task.
    pub task_id: TaskId,
    /// App channel.
    pub app_id: AppId,
    /// Window the figures cover.
    pub window: StatisticsWindow,
    /// User tasks received in the window.
    pub received_amount: u64,
    /// User tasks completed in the window.
    pub completed_amount: u64,
    /// User tasks completed in the window that were later accepted.
    pub accepted_amount: u64,
    /// Flow summed over the accepted user tasks.
    pub total_flow: u64,
}

impl TaskAppStatistics {
    /// Creates an all-zero record for a task/app pair.
    #[must_use]
    pub const fn empty(task_id: TaskId, app_id: AppId, window: StatisticsWindow) -> Self {
        Self {
            task_id,
            app_id,
            window,
            received_amount: 0,
            completed_amount: 0,
            accepted_amount: 0,
            total_flow: 0,
        }
    }
}

/// Review throughput of one staff member during a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerTaskStatistics {
    /// Reviewer.
    pub reviewer_user_id: StaffUserId,
    /// Window the figures cover.
    pub window: StatisticsWindow,
    /// Reviews that accepted the work.
    pub accepted_amount: u64,
    /// Reviews of any outcome.
    pub reviewed_amount: u64,
}

impl ReviewerTaskStatistics {
    /// Creates an all-zero record for a reviewer.
    #[must_use]
    pub const fn empty(reviewer_user_id: StaffUserId, window: StatisticsWindow) -> Self {
        Self {
            reviewer_user_id,
            window,
            accepted_amount: 0,
            reviewed_amount: 0,
        }
    }
}
