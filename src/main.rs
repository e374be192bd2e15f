use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpost::config::AppConfig;
use inkpost::mail::{LogMailer, Mailer, ResendMailer};
use inkpost::media::PictureStore;
use inkpost::posts::repository::{InMemoryPostRepository, PostgresPostRepository};
use inkpost::session::repository::{InMemorySessionRepository, PostgresSessionRepository};
use inkpost::shared::AppState;
use inkpost::users::repository::{InMemoryUserRepository, PostgresUserRepository};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Inkpost blog server");

    let config = AppConfig::from_env();

    let mailer: Arc<dyn Mailer + Send + Sync> = match &config.resend_api_key {
        Some(key) => {
            Arc::new(ResendMailer::new(key.clone()).expect("Failed to build mail client"))
        }
        None => {
            info!("RESEND_API_KEY not set, outbound mail will be logged only");
            Arc::new(LogMailer)
        }
    };
    let pictures = Arc::new(PictureStore::new(config.pictures_dir.clone()));

    // Postgres when configured, in-memory repositories for local hacking.
    let state = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("Failed to connect to database");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            AppState::new(
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresPostRepository::new(pool.clone())),
                Arc::new(PostgresSessionRepository::new(pool)),
                mailer,
                pictures,
                config.clone(),
            )
        }
        None => {
            info!("DATABASE_URL not set, using in-memory repositories");
            AppState::new(
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryPostRepository::new()),
                Arc::new(InMemorySessionRepository::new()),
                mailer,
                pictures,
                config.clone(),
            )
        }
    };

    let app = inkpost::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
