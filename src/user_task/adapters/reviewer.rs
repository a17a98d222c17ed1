//! Reviewer picker backed by a staff repository.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LifecycleConfig;
use crate::user_task::{
    domain::{StaffRole, StaffUserId},
    ports::{RepositoryResult, ReviewerPicker, StaffRepository},
};

/// Picks reviewers at random among active staff holding a role.
#[derive(Debug, Clone)]
pub struct StaffReviewerPicker<S>
where
    S: StaffRepository,
{
    staff: Arc<S>,
    role: StaffRole,
}

impl<S> StaffReviewerPicker<S>
where
    S: StaffRepository,
{
    /// Creates a picker drawing from `staff` accounts holding `role`.
    #[must_use]
    pub const fn new(staff: Arc<S>, role: StaffRole) -> Self {
        Self { staff, role }
    }

    /// Creates a picker drawing from `staff` accounts holding the configured
    /// `lifecycle.reviewer_role`.
    #[must_use]
    pub const fn from_config(staff: Arc<S>, config: &LifecycleConfig) -> Self {
        Self::new(staff, config.reviewer_role)
    }

    /// Returns the role reviewers are drawn from.
    #[must_use]
    pub const fn role(&self) -> StaffRole {
        self.role
    }
}

#[async_trait]
impl<S> ReviewerPicker for StaffReviewerPicker<S>
where
    S: StaffRepository,
{
    async fn pick_random_active_reviewer(&self) -> RepositoryResult<Option<StaffUserId>> {
        let reviewer = self.staff.find_one_random_active(self.role).await?;
        Ok(reviewer.map(|staff| staff.id()))
    }
}
