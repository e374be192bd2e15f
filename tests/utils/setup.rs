use axum::Router;
use std::sync::Arc;

use inkpost::config::AppConfig;
use inkpost::mail::RecordingMailer;
use inkpost::media::PictureStore;
use inkpost::posts::repository::InMemoryPostRepository;
use inkpost::session::repository::InMemorySessionRepository;
use inkpost::shared::AppState;
use inkpost::users::repository::InMemoryUserRepository;

/// A fully wired application over in-memory repositories, with handles to
/// the repositories and the recording mailer for assertions.
pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub posts: Arc<InMemoryPostRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUserRepository::new());
    let posts = Arc::new(InMemoryPostRepository::new());
    let sessions = Arc::new(InMemorySessionRepository::new());
    let mailer = Arc::new(RecordingMailer::new());

    let static_dir = std::env::temp_dir().join(format!("inkpost-itest-{}", uuid::Uuid::new_v4()));
    let config = AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        secret_key: "integration-test-secret".to_string(),
        base_url: "http://localhost:3000".to_string(),
        resend_api_key: None,
        mail_from: "noreply@inkpost.dev".to_string(),
        pictures_dir: static_dir.join("pics"),
        static_dir,
        session_days: 1,
        remember_days: 30,
        reset_token_minutes: 30,
    };

    let pictures = Arc::new(PictureStore::new(config.pictures_dir.clone()));
    let state = AppState::new(
        users.clone(),
        posts.clone(),
        sessions.clone(),
        mailer.clone(),
        pictures,
        config,
    );

    TestApp {
        router: inkpost::router(state),
        users,
        posts,
        sessions,
        mailer,
    }
}
