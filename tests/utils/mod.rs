// Shared helpers for the integration tests
pub mod actions;
pub mod setup;
