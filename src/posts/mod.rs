// Public API - what other modules can use
pub use models::{NewPost, Page, PostModel};
pub use service::{HOME_PER_PAGE, USER_PER_PAGE};

// Internal modules
pub mod forms;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
