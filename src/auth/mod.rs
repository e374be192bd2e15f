// Public API - what other modules can use
pub use service::{AuthService, RegisterOutcome, ResetOutcome};

// Internal modules
pub mod forms;
pub mod handlers;
pub mod password;
pub mod service;
