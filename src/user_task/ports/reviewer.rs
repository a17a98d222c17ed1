//! Reviewer selection capability used when a user task is completed.

use super::RepositoryResult;
use crate::user_task::domain::StaffUserId;
use async_trait::async_trait;

/// Picks a reviewer for a freshly completed user task.
#[async_trait]
pub trait ReviewerPicker: Send + Sync {
    /// Returns one active reviewer chosen at random, or `None` when nobody
    /// is available.
    async fn pick_random_active_reviewer(&self) -> RepositoryResult<Option<StaffUserId>>;
}
