//! Adapter implementations of the user-task ports.

pub mod memory;
pub mod postgres;
mod reviewer;

pub use reviewer::StaffReviewerPicker;
