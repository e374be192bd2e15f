// Public API - what other modules can use
pub use resend::ResendMailer;

// Internal modules
mod resend;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use tracing::{info, instrument};

use crate::shared::AppError;

/// Outbound message payload, shaped to match the Resend API body.
#[derive(Debug, Clone, Serialize)]
pub struct SendEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

/// Trait for outbound mail delivery
#[async_trait]
pub trait Mailer {
    async fn send(&self, email: SendEmail) -> Result<(), AppError>;
}

/// Development mailer that logs instead of sending; used when no API key is
/// configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    #[instrument(skip(self, email))]
    async fn send(&self, email: SendEmail) -> Result<(), AppError> {
        info!(
            to = ?email.to,
            subject = %email.subject,
            body = %email.text,
            "Mail delivery skipped (no API key configured)"
        );
        Ok(())
    }
}

/// In-memory mailer that records outbound messages for tests.
pub struct RecordingMailer {
    sent: Mutex<Vec<SendEmail>>,
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent so far, in order
    pub fn sent(&self) -> Vec<SendEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: SendEmail) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
