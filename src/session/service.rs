use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::SessionModel,
    repository::SessionRepository,
    token::TokenConfig,
    types::SessionClaims,
};
use crate::shared::AppError;

/// Service for handling session business logic
pub struct SessionService {
    tokens: TokenConfig,
    repository: Arc<dyn SessionRepository + Send + Sync>,
}

impl SessionService {
    pub fn new(tokens: TokenConfig, repository: Arc<dyn SessionRepository + Send + Sync>) -> Self {
        Self { tokens, repository }
    }

    /// Creates a session row for the user and returns the signed token that
    /// goes into the session cookie.
    #[instrument(skip(self))]
    pub async fn log_in(&self, user_id: i64, remember: bool) -> Result<String, AppError> {
        let days = if remember {
            self.tokens.remember_days
        } else {
            self.tokens.session_days
        };
        let session = SessionModel::new(user_id, days, remember);
        self.repository.create_session(&session).await?;

        let token = self
            .tokens
            .create_session_token(session.id.clone(), user_id, remember)?;

        info!(user_id, session_id = %session.id, remember, "Session established");
        Ok(token)
    }

    /// Validates a session token against both its signature and the session
    /// store, so logout and expiry revoke server-side.
    #[instrument(skip(self, token))]
    pub async fn validate(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims = self.tokens.validate_session_token(token)?;

        match self.repository.get_session(&claims.session_id).await? {
            Some(session) => {
                if session.is_expired() {
                    debug!(session_id = %claims.session_id, "Session row has expired");
                    return Err(AppError::Unauthorized("Session has expired".to_string()));
                }
                Ok(claims)
            }
            None => {
                debug!(session_id = %claims.session_id, "Session not found, may be revoked");
                Err(AppError::Unauthorized(
                    "Session not found or has been revoked".to_string(),
                ))
            }
        }
    }

    /// Tears the session down. Deleting an already-gone session is not an
    /// error so logout stays idempotent.
    #[instrument(skip(self))]
    pub async fn log_out(&self, session_id: &str) -> Result<(), AppError> {
        match self.repository.delete_session(session_id).await {
            Ok(()) => {
                info!(session_id = %session_id, "Session revoked");
                Ok(())
            }
            Err(AppError::NotFound(_)) => {
                debug!(session_id = %session_id, "Session already gone at logout");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to revoke session");
                Err(e)
            }
        }
    }

    /// Removes expired session rows from the store.
    #[instrument(skip(self))]
    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        self.repository.cleanup_expired_sessions().await
    }
}
