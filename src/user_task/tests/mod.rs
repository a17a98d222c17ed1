//! Unit tests for the user-task lifecycle.
