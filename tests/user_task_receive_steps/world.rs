//! Shared world state for user-task receive BDD scenarios.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use taskmarket::{
    config::LifecycleConfig,
    user_task::{
        adapters::{
            StaffReviewerPicker,
            memory::{InMemoryStaffRepository, InMemoryUserTaskStore},
        },
        domain::{Task, UserTask},
        services::{UserTaskLifecycleError, UserTaskLifecycleService},
    },
};

/// Clock that scenarios move forward explicitly.
#[derive(Debug)]
pub struct ScenarioClock {
    now: Mutex<DateTime<Utc>>,
}

impl ScenarioClock {
    /// Moves the clock forward.
    ///
    /// # Errors
    ///
    /// Returns an error if the clock lock is poisoned.
    pub fn advance(&self, by: Duration) -> Result<(), eyre::Report> {
        let mut now = self
            .now
            .lock()
            .map_err(|err| eyre::eyre!("clock lock poisoned: {err}"))?;
        *now += by;
        Ok(())
    }

    fn read(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map_or_else(|poisoned| *poisoned.into_inner(), |now| *now)
    }
}

impl Clock for ScenarioClock {
    fn local(&self) -> DateTime<Local> {
        self.read().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.read()
    }
}

/// Service type used by the BDD world.
pub type TestLifecycleService = UserTaskLifecycleService<
    InMemoryUserTaskStore,
    StaffReviewerPicker<InMemoryStaffRepository>,
    ScenarioClock,
>;

/// Scenario world for user-task receive behaviour tests.
pub struct ReceiveWorld {
    pub store: Arc<InMemoryUserTaskStore>,
    pub clock: Arc<ScenarioClock>,
    pub service: TestLifecycleService,
    pub task: Option<Task>,
    pub last_receive_result: Option<Result<UserTask, UserTaskLifecycleError>>,
}

impl ReceiveWorld {
    /// Creates a world with no task and a clock at a fixed instant.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryUserTaskStore::new());
        let start = Utc
            .with_ymd_and_hms(2024, 6, 3, 8, 0, 0)
            .single()
            .unwrap_or_default();
        let clock = Arc::new(ScenarioClock {
            now: Mutex::new(start),
        });
        let config = LifecycleConfig::default();
        let picker =
            StaffReviewerPicker::from_config(Arc::new(InMemoryStaffRepository::new()), &config);
        let service =
            UserTaskLifecycleService::new(Arc::clone(&store), Arc::new(picker), Arc::clone(&clock))
                .with_config(config);

        Self {
            store,
            clock,
            service,
            task: None,
            last_receive_result: None,
        }
    }

    /// Returns the task seeded by a given step.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has been seeded.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for ReceiveWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReceiveWorld {
    ReceiveWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
