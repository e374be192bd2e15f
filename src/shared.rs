use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::config::AppConfig;
use crate::flash;
use crate::mail::Mailer;
use crate::media::PictureStore;
use crate::posts::repository::PostRepository;
use crate::session::repository::SessionRepository;
use crate::session::token::TokenConfig;
use crate::users::repository::UserRepository;
use crate::views;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository + Send + Sync>,
    pub posts: Arc<dyn PostRepository + Send + Sync>,
    pub sessions: Arc<dyn SessionRepository + Send + Sync>,
    pub mailer: Arc<dyn Mailer + Send + Sync>,
    pub pictures: Arc<PictureStore>,
    pub tokens: TokenConfig,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        posts: Arc<dyn PostRepository + Send + Sync>,
        sessions: Arc<dyn SessionRepository + Send + Sync>,
        mailer: Arc<dyn Mailer + Send + Sync>,
        pictures: Arc<PictureStore>,
        config: AppConfig,
    ) -> Self {
        let tokens = TokenConfig::from_config(&config);
        Self {
            users,
            posts,
            sessions,
            mailer,
            pictures,
            tokens,
            config: Arc::new(config),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("token error: {0}")]
    Token(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("mail error: {0}")]
    Mail(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized(msg) => {
                warn!(reason = %msg, "Rejecting unauthenticated request");
                flash::redirect("/login", "info", "Please log in to access that page.")
                    .unwrap_or_else(|_| Redirect::to("/login").into_response())
            }
            AppError::Forbidden(msg) => {
                warn!(reason = %msg, "Rejecting request from non-owner");
                error_page(StatusCode::FORBIDDEN, "You do not have permission to do that.")
            }
            AppError::NotFound(what) => {
                error_page(StatusCode::NOT_FOUND, &format!("{what} not found."))
            }
            AppError::Token(_) => error_page(StatusCode::BAD_REQUEST, "Invalid or expired token."),
            AppError::Validation(msg) | AppError::InvalidImage(msg) => {
                error_page(StatusCode::UNPROCESSABLE_ENTITY, &msg)
            }
            other => {
                // Detail goes to the log, never to the client.
                warn!(error = %other, "Request failed with internal error");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong on our end. Please try again.",
                )
            }
        }
    }
}

/// Renders the shared error template, falling back to plain text if the
/// template itself fails.
fn error_page(status: StatusCode, message: &str) -> Response {
    use askama::Template;

    let template = views::ErrorTemplate {
        current_user: None,
        flashes: Vec::new(),
        code: status.as_u16(),
        message: message.to_string(),
    };
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, message.to_string()).into_response(),
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::mail::RecordingMailer;
    use crate::posts::repository::InMemoryPostRepository;
    use crate::session::repository::InMemorySessionRepository;
    use crate::users::repository::InMemoryUserRepository;

    /// Configuration pointing at a throwaway picture directory.
    pub fn test_config() -> AppConfig {
        let static_dir =
            std::env::temp_dir().join(format!("inkpost-test-{}", uuid::Uuid::new_v4()));
        AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            secret_key: "unit-test-secret".to_string(),
            base_url: "http://localhost:3000".to_string(),
            resend_api_key: None,
            mail_from: "noreply@inkpost.dev".to_string(),
            pictures_dir: static_dir.join("pics"),
            static_dir,
            session_days: 1,
            remember_days: 30,
            reset_token_minutes: 30,
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        users: Option<Arc<dyn UserRepository + Send + Sync>>,
        posts: Option<Arc<dyn PostRepository + Send + Sync>>,
        sessions: Option<Arc<dyn SessionRepository + Send + Sync>>,
        mailer: Option<Arc<dyn Mailer + Send + Sync>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                users: None,
                posts: None,
                sessions: None,
                mailer: None,
            }
        }

        pub fn with_users(mut self, users: Arc<dyn UserRepository + Send + Sync>) -> Self {
            self.users = Some(users);
            self
        }

        pub fn with_posts(mut self, posts: Arc<dyn PostRepository + Send + Sync>) -> Self {
            self.posts = Some(posts);
            self
        }

        pub fn with_sessions(mut self, sessions: Arc<dyn SessionRepository + Send + Sync>) -> Self {
            self.sessions = Some(sessions);
            self
        }

        pub fn with_mailer(mut self, mailer: Arc<dyn Mailer + Send + Sync>) -> Self {
            self.mailer = Some(mailer);
            self
        }

        pub fn build(self) -> AppState {
            let config = test_config();
            let pictures = Arc::new(PictureStore::new(config.pictures_dir.clone()));
            AppState::new(
                self.users
                    .unwrap_or_else(|| Arc::new(InMemoryUserRepository::new())),
                self.posts
                    .unwrap_or_else(|| Arc::new(InMemoryPostRepository::new())),
                self.sessions
                    .unwrap_or_else(|| Arc::new(InMemorySessionRepository::new())),
                self.mailer
                    .unwrap_or_else(|| Arc::new(RecordingMailer::new())),
                pictures,
                config,
            )
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
