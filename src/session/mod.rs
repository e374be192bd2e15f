// Public API - what other modules can use
pub use middleware::{load_current_user, require_login, CurrentUser};
pub use types::SessionClaims;

// Internal modules
pub mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;
pub mod types;
