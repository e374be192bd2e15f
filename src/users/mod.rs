// Public API - what other modules can use
pub use models::{NewUser, UserModel, DEFAULT_PICTURE};

// Internal modules
pub mod forms;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
