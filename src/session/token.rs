use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::{ResetClaims, SessionClaims, RESET_PURPOSE};
use crate::config::AppConfig;
use crate::shared::AppError;

/// Signs and validates the two token kinds issued by the server: session
/// tokens (held in the session cookie) and password-reset tokens (embedded
/// in emailed links). Both are signed with the same server secret.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub session_days: i64,
    pub remember_days: i64,
    pub reset_minutes: i64,
}

impl TokenConfig {
    pub fn new(secret: String, session_days: i64, remember_days: i64, reset_minutes: i64) -> Self {
        Self {
            secret,
            session_days,
            remember_days,
            reset_minutes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.secret_key.clone(),
            config.session_days,
            config.remember_days,
            config.reset_token_minutes,
        )
    }

    /// Creates a signed session token. The remember flag selects the longer
    /// expiry window.
    #[instrument(skip(self, session_id))]
    pub fn create_session_token(
        &self,
        session_id: String,
        user_id: i64,
        remember: bool,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let days = if remember {
            self.remember_days
        } else {
            self.session_days
        };
        let exp = (now + Duration::days(days)).timestamp() as usize;

        debug!(days, user_id, "Creating session token");

        let claims = SessionClaims {
            session_id,
            user_id,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode session token");
            AppError::Token(e.to_string())
        })
    }

    /// Validates a session token and returns the claims if valid
    #[instrument(skip(self, token))]
    pub fn validate_session_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode session token");
            AppError::Token(e.to_string())
        })
    }

    /// Creates a short-lived password-reset token for the given user.
    #[instrument(skip(self))]
    pub fn create_reset_token(&self, user_id: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::minutes(self.reset_minutes)).timestamp() as usize;

        debug!(user_id, minutes = self.reset_minutes, "Creating reset token");

        let claims = ResetClaims {
            user_id,
            purpose: RESET_PURPOSE.to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode reset token");
            AppError::Token(e.to_string())
        })
    }

    /// Validates a password-reset token.
    ///
    /// Tampered payloads, wrong signatures, expired tokens and tokens issued
    /// for another purpose all fail the same way.
    #[instrument(skip(self, token))]
    pub fn validate_reset_token(&self, token: &str) -> Result<ResetClaims, AppError> {
        let claims = decode::<ResetClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &self.validation(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode reset token");
            AppError::Token(e.to_string())
        })?;

        if claims.purpose != RESET_PURPOSE {
            debug!(purpose = %claims.purpose, "Token purpose mismatch");
            return Err(AppError::Token("wrong token purpose".to_string()));
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        // Expired means expired; no clock-skew grace window.
        validation.leeway = 0;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tokens() -> TokenConfig {
        TokenConfig::new("unit-test-secret".to_string(), 1, 30, 30)
    }

    #[test]
    fn test_create_and_validate_session_token() {
        let config = test_tokens();
        let token = config
            .create_session_token("session-1".to_string(), 7, false)
            .unwrap();
        assert!(!token.is_empty());

        let claims = config.validate_session_token(&token).unwrap();
        assert_eq!(claims.session_id, "session-1");
        assert_eq!(claims.user_id, 7);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_remember_extends_expiry() {
        let config = test_tokens();
        let short = config
            .create_session_token("a".to_string(), 1, false)
            .unwrap();
        let long = config
            .create_session_token("b".to_string(), 1, true)
            .unwrap();

        let short_claims = config.validate_session_token(&short).unwrap();
        let long_claims = config.validate_session_token(&long).unwrap();
        assert!(long_claims.exp > short_claims.exp);
    }

    #[test]
    fn test_invalid_token() {
        let config = test_tokens();
        assert!(config.validate_session_token("invalid.token.here").is_err());
        assert!(config.validate_reset_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_tampered_token_fails() {
        let config = test_tokens();
        let token = config.create_reset_token(1).unwrap();

        // Flip a character in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload: Vec<char> = parts[1].chars().collect();
        payload[0] = if payload[0] == 'A' { 'B' } else { 'A' };
        parts[1] = payload.into_iter().collect();
        let tampered = parts.join(".");

        assert!(config.validate_reset_token(&tampered).is_err());
    }

    #[test]
    fn test_expired_reset_token_fails() {
        let config = test_tokens();
        let now = Utc::now();
        let claims = ResetClaims {
            user_id: 1,
            purpose: RESET_PURPOSE.to_string(),
            exp: (now - Duration::minutes(5)).timestamp() as usize,
            iat: (now - Duration::minutes(35)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("unit-test-secret".as_ref()),
        )
        .unwrap();

        assert!(config.validate_reset_token(&token).is_err());
    }

    #[test]
    fn test_session_token_rejected_as_reset_token() {
        let config = test_tokens();
        let session = config
            .create_session_token("session-1".to_string(), 7, false)
            .unwrap();
        assert!(config.validate_reset_token(&session).is_err());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let config = test_tokens();
        let other = TokenConfig::new("different-secret".to_string(), 1, 30, 30);

        let token = config.create_reset_token(1).unwrap();
        assert!(other.validate_reset_token(&token).is_err());
        assert!(config.validate_reset_token(&token).is_ok());
    }
}
