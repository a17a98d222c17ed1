//! Staff accounts that review completed user tasks.

use super::{ParseStaffError, StaffUserId};
use serde::{Deserialize, Serialize};

/// Role held by a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Reviews completed user tasks.
    TaskReviewer,
    /// Manages campaigns and channels.
    Administrator,
}

impl StaffRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskReviewer => "task_reviewer",
            Self::Administrator => "administrator",
        }
    }
}

impl TryFrom<&str> for StaffRole {
    type Error = ParseStaffError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task_reviewer" => Ok(Self::TaskReviewer),
            "administrator" => Ok(Self::Administrator),
            _ => Err(ParseStaffError {
                kind: "role",
                value: value.to_owned(),
            }),
        }
    }
}

/// Account status of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    /// May be assigned work.
    Active,
    /// Excluded from assignment.
    Disabled,
}

impl StaffStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

impl TryFrom<&str> for StaffStatus {
    type Error = ParseStaffError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ParseStaffError {
                kind: "status",
                value: value.to_owned(),
            }),
        }
    }
}

/// Staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    id: StaffUserId,
    name: String,
    role: StaffRole,
    status: StaffStatus,
}

impl StaffUser {
    /// Creates an active staff account.
    #[must_use]
    pub fn new(name: impl Into<String>, role: StaffRole) -> Self {
        Self {
            id: StaffUserId::new(),
            name: name.into(),
            role,
            status: StaffStatus::Active,
        }
    }

    /// Reconstructs a staff account from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        id: StaffUserId,
        name: String,
        role: StaffRole,
        status: StaffStatus,
    ) -> Self {
        Self {
            id,
            name,
            role,
            status,
        }
    }

    /// Returns a copy of this account with the given status.
    #[must_use]
    pub fn with_status(mut self, status: StaffStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> StaffUserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> StaffRole {
        self.role
    }

    /// Returns the account status.
    #[must_use]
    pub const fn status(&self) -> StaffStatus {
        self.status
    }

    /// Returns `true` when the account holds `role` and is active.
    #[must_use]
    pub fn is_active_in(&self, role: StaffRole) -> bool {
        self.role == role && self.status == StaffStatus::Active
    }
}
