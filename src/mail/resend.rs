use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::{Mailer, SendEmail};
use crate::shared::AppError;

const RESEND_API: &str = "https://api.resend.com/emails";

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_key: String) -> Result<Self, AppError> {
        let client = ClientBuilder::new()
            .user_agent("inkpost/1.0 (+reqwest)")
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Mail(format!("build client failed: {e}")))?;

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    #[instrument(skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, email: SendEmail) -> Result<(), AppError> {
        debug!(to = ?email.to, "Dispatching email via Resend");

        let started = Instant::now();
        let response = self
            .client
            .post(RESEND_API)
            .bearer_auth(&self.api_key) // do NOT log the key
            .json(&email)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Resend request failed");
                AppError::Mail(format!("send failed: {e}"))
            })?;

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Mail(format!("read body failed: {e}")))?;

        if status.is_success() {
            debug!(status = %status, elapsed_ms, "Resend accepted the message");
            Ok(())
        } else {
            warn!(status = %status, body = %body, "Resend rejected the message");
            Err(AppError::Mail(format!("Resend API error: HTTP {status}")))
        }
    }
}
