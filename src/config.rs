use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup.
///
/// Every value has a development default so the server can run without any
/// environment set up; production deployments are expected to provide at
/// least `DATABASE_URL`, `SECRET_KEY` and `RESEND_API_KEY`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    /// Postgres connection string; when absent the in-memory repositories are used
    pub database_url: Option<String>,
    /// Secret used to sign session and password-reset tokens
    pub secret_key: String,
    /// External base URL, used to build password-reset links
    pub base_url: String,
    /// Resend API key; when absent outbound mail is logged instead of sent
    pub resend_api_key: Option<String>,
    /// Sender address for outbound mail
    pub mail_from: String,
    /// Directory served under /static
    pub static_dir: PathBuf,
    /// Directory resized profile pictures are written to
    pub pictures_dir: PathBuf,
    /// Session lifetime in days without the remember flag
    pub session_days: i64,
    /// Session lifetime in days with the remember flag
    pub remember_days: i64,
    /// Password-reset token lifetime in minutes
    pub reset_token_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let static_dir: PathBuf = env::var("STATIC_DIR")
            .unwrap_or_else(|_| "static".to_string())
            .into();
        let pictures_dir = static_dir.join("pics");

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            secret_key: env::var("SECRET_KEY")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@inkpost.dev".to_string()),
            static_dir,
            pictures_dir,
            session_days: env_or("SESSION_DAYS", 1),
            remember_days: env_or("REMEMBER_DAYS", 30),
            reset_token_minutes: env_or("RESET_TOKEN_MINUTES", 30),
        }
    }
}

fn env_or(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
