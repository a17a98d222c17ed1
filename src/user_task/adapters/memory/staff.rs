//! In-memory staff directory.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::user_task::{
    domain::{StaffRole, StaffUser, StaffUserId},
    ports::{RepositoryError, RepositoryResult, StaffRepository},
};

/// Thread-safe in-memory staff repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStaffRepository {
    staff: Arc<RwLock<HashMap<StaffUserId, StaffUser>>>,
}

impl InMemoryStaffRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl StaffRepository for InMemoryStaffRepository {
    async fn store(&self, staff: &StaffUser) -> RepositoryResult<()> {
        let mut directory = self.staff.write().map_err(poisoned)?;
        if directory.contains_key(&staff.id()) {
            return Err(RepositoryError::DuplicateStaffUser(staff.id()));
        }
        directory.insert(staff.id(), staff.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: StaffUserId) -> RepositoryResult<Option<StaffUser>> {
        let directory = self.staff.read().map_err(poisoned)?;
        Ok(directory.get(&id).cloned())
    }

    async fn find_one_random_active(&self, role: StaffRole) -> RepositoryResult<Option<StaffUser>> {
        let directory = self.staff.read().map_err(poisoned)?;
        let candidates: Vec<&StaffUser> = directory
            .values()
            .filter(|staff| staff.is_active_in(role))
            .collect();
        Ok(candidates
            .choose(&mut rand::thread_rng())
            .map(|staff| (*staff).clone()))
    }
}
