//! Layered configuration.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `taskmarket.toml` in the working directory, when present
//! 3. Environment variables prefixed `TASKMARKET_`, with `__` separating
//!    nested keys (`TASKMARKET_LIFECYCLE__MAX_COMMIT_ATTEMPTS=5`)

use crate::user_task::domain::{StaffRole, time::UNLIMITED_REVIEW_HOURS};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "taskmarket.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TASKMARKET_";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed or a value had the wrong shape.
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A loaded value is out of range.
    #[error("invalid configuration value for {key}: {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        key: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Lifecycle tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Review window in hours used when a task sets no review period.
    pub unlimited_review_hours: u64,
    /// Commit attempts before a lost optimistic race is reported.
    pub max_commit_attempts: u32,
    /// Role a staff account needs to be assigned reviews.
    pub reviewer_role: StaffRole,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            unlimited_review_hours: UNLIMITED_REVIEW_HOURS,
            max_commit_attempts: 3,
            reviewer_role: StaffRole::TaskReviewer,
        }
    }
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; unset when only in-memory adapters are used.
    pub url: Option<String>,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 8,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Lifecycle tuning.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl MarketConfig {
    /// Loads configuration from defaults, `taskmarket.toml`, and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a source cannot be parsed or a value is
    /// out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(Path::new(CONFIG_FILE_NAME)))
    }

    /// Builds the provider chain, reading the TOML layer from `path`.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extracts and validates configuration from an existing figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when extraction or validation fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lifecycle.max_commit_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "lifecycle.max_commit_attempts",
                reason: "must be at least 1",
            });
        }
        if self.lifecycle.unlimited_review_hours == 0 {
            return Err(ConfigError::Invalid {
                key: "lifecycle.unlimited_review_hours",
                reason: "must be positive",
            });
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "database.pool_size",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
