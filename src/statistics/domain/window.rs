//! Reporting windows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raised when a window ends at or before its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("statistics window must end after it begins ({begin} .. {end})")]
pub struct InvalidWindow {
    /// Requested start.
    pub begin: DateTime<Utc>,
    /// Requested end.
    pub end: DateTime<Utc>,
}

/// Half-open time range `[begin, end)` that statistics are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatisticsWindow {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl StatisticsWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidWindow`] when `end <= begin`.
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidWindow> {
        if end <= begin {
            return Err(InvalidWindow { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Returns the inclusive start.
    #[must_use]
    pub const fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    /// Returns the exclusive end.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` when `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.begin <= instant && instant < self.end
    }

    /// Returns `true` when the two windows share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.begin < other.end && other.begin < self.end
    }
}

impl fmt::Display for StatisticsWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}
