//! In-memory adapters for lifecycle tests and embedded use.

mod staff;
mod store;

pub use staff::InMemoryStaffRepository;
pub(crate) use store::InMemoryUserTaskState;
pub use store::InMemoryUserTaskStore;
