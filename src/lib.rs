// Library crate for the Inkpost blog server
// This file exposes the public API for integration tests

pub mod app;
pub mod auth;
pub mod config;
pub mod cookies;
pub mod flash;
pub mod mail;
pub mod media;
pub mod posts;
pub mod session;
pub mod shared;
pub mod users;
pub mod views;

// Re-export commonly used types for easier access in tests
pub use app::router;
pub use config::AppConfig;
pub use session::CurrentUser;
pub use shared::{AppError, AppState};
