use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::forms::{LoginForm, RegistrationForm, ResetPasswordForm};
use super::password;
use crate::mail::{Mailer, SendEmail};
use crate::session::token::TokenConfig;
use crate::shared::{AppError, AppState};
use crate::users::models::NewUser;
use crate::users::repository::UserRepository;
use crate::users::UserModel;

/// Result of a registration attempt
pub enum RegisterOutcome {
    Created(UserModel),
    Invalid(Vec<String>),
}

/// Result of consuming a password-reset token
pub enum ResetOutcome {
    Done,
    InvalidToken,
    Invalid(Vec<String>),
}

/// Service for handling registration, credential checks and the
/// password-reset flow.
pub struct AuthService {
    users: Arc<dyn UserRepository + Send + Sync>,
    tokens: TokenConfig,
    mailer: Arc<dyn Mailer + Send + Sync>,
    base_url: String,
    mail_from: String,
}

impl AuthService {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            tokens: state.tokens.clone(),
            mailer: Arc::clone(&state.mailer),
            base_url: state.config.base_url.clone(),
            mail_from: state.config.mail_from.clone(),
        }
    }

    /// Validates the registration form, checks uniqueness and creates the
    /// user with a hashed password.
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<RegisterOutcome, AppError> {
        let mut errors = form.validate();

        if self.users.find_by_username(&form.username).await?.is_some() {
            errors.push("That username is already taken.".to_string());
        }
        if self.users.find_by_email(&form.email).await?.is_some() {
            errors.push("That email is already registered.".to_string());
        }
        if !errors.is_empty() {
            debug!(error_count = errors.len(), "Registration rejected");
            return Ok(RegisterOutcome::Invalid(errors));
        }

        let password_hash = password::hash(&form.password)?;
        let user = self
            .users
            .create_user(NewUser::new(
                form.username.clone(),
                form.email.clone(),
                password_hash,
            ))
            .await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(RegisterOutcome::Created(user))
    }

    /// Checks credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    #[instrument(skip(self, form))]
    pub async fn authenticate(&self, form: &LoginForm) -> Result<Option<UserModel>, AppError> {
        let Some(user) = self.users.find_by_email(&form.email).await? else {
            debug!("Login attempt for unknown email");
            return Ok(None);
        };

        if !password::verify(&form.password, &user.password_hash) {
            debug!(user_id = user.id, "Login attempt with wrong password");
            return Ok(None);
        }

        info!(user_id = user.id, "Credentials verified");
        Ok(Some(user))
    }

    /// Issues a reset token and mails the link to the given address.
    ///
    /// An unknown address is a silent no-op so the response never reveals
    /// whether an account exists.
    #[instrument(skip(self))]
    pub async fn start_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!("Reset requested for unknown email, skipping send");
            return Ok(());
        };

        let token = self.tokens.create_reset_token(user.id)?;
        let link = format!(
            "{}/reset_password/{token}",
            self.base_url.trim_end_matches('/')
        );
        let body = format!(
            "To reset your password, visit the following link:\n\n\
             {link}\n\n\
             If you did not make this request, simply ignore this email and \
             no changes will be made.\n"
        );

        self.mailer
            .send(SendEmail {
                from: self.mail_from.clone(),
                to: vec![user.email.clone()],
                subject: "Password Reset Request".to_string(),
                text: body,
            })
            .await?;

        info!(user_id = user.id, "Password reset email dispatched");
        Ok(())
    }

    /// Verifies the reset token and stores the new password hash.
    #[instrument(skip(self, token, form))]
    pub async fn reset_password(
        &self,
        token: &str,
        form: &ResetPasswordForm,
    ) -> Result<ResetOutcome, AppError> {
        let Ok(claims) = self.tokens.validate_reset_token(token) else {
            return Ok(ResetOutcome::InvalidToken);
        };
        let Some(user) = self.users.get_by_id(claims.user_id).await? else {
            // The account vanished between issue and use; same outcome as a
            // bad token.
            return Ok(ResetOutcome::InvalidToken);
        };

        let errors = form.validate();
        if !errors.is_empty() {
            return Ok(ResetOutcome::Invalid(errors));
        }

        let password_hash = password::hash(&form.password)?;
        self.users.update_password(user.id, &password_hash).await?;

        info!(user_id = user.id, "Password reset completed");
        Ok(ResetOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::RecordingMailer;
    use crate::users::repository::InMemoryUserRepository;

    fn fixture() -> (AuthService, Arc<InMemoryUserRepository>, Arc<RecordingMailer>) {
        let users = Arc::new(InMemoryUserRepository::new());
        let mailer = Arc::new(RecordingMailer::new());
        let service = AuthService {
            users: users.clone(),
            tokens: TokenConfig::new("unit-test-secret".to_string(), 1, 30, 30),
            mailer: mailer.clone(),
            base_url: "http://localhost:3000".to_string(),
            mail_from: "noreply@inkpost.dev".to_string(),
        };
        (service, users, mailer)
    }

    fn registration() -> RegistrationForm {
        RegistrationForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter42".to_string(),
            confirm_password: "hunter42".to_string(),
        }
    }

    fn login(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.to_string(),
            password: password.to_string(),
            remember: None,
            next: None,
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (service, users, _mailer) = fixture();

        let outcome = service.register(&registration()).await.unwrap();
        let RegisterOutcome::Created(user) = outcome else {
            panic!("registration failed");
        };

        let stored = users.get_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "hunter42");
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_duplicate_creates_no_row() {
        let (service, users, _mailer) = fixture();
        service.register(&registration()).await.unwrap();

        let mut duplicate = registration();
        duplicate.username = "alice2".to_string(); // same email
        let outcome = service.register(&duplicate).await.unwrap();

        assert!(matches!(outcome, RegisterOutcome::Invalid(_)));
        assert_eq!(users.user_count(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let (service, _users, _mailer) = fixture();
        service.register(&registration()).await.unwrap();

        let result = service
            .authenticate(&login("alice@example.com", "wrong"))
            .await
            .unwrap();
        assert!(result.is_none());

        let result = service
            .authenticate(&login("nobody@example.com", "hunter42"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_correct_credentials() {
        let (service, _users, _mailer) = fixture();
        service.register(&registration()).await.unwrap();

        let result = service
            .authenticate(&login("alice@example.com", "hunter42"))
            .await
            .unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_reset_flow_round_trip() {
        let (service, _users, mailer) = fixture();
        service.register(&registration()).await.unwrap();

        service
            .start_password_reset("alice@example.com")
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Password Reset Request");
        assert_eq!(sent[0].to, vec!["alice@example.com".to_string()]);

        // Pull the token out of the emailed link.
        let token = sent[0]
            .text
            .split("/reset_password/")
            .nth(1)
            .unwrap()
            .split_whitespace()
            .next()
            .unwrap()
            .to_string();

        let form = ResetPasswordForm {
            password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        };
        let outcome = service.reset_password(&token, &form).await.unwrap();
        assert!(matches!(outcome, ResetOutcome::Done));

        // Old password no longer works, new one does.
        assert!(service
            .authenticate(&login("alice@example.com", "hunter42"))
            .await
            .unwrap()
            .is_none());
        assert!(service
            .authenticate(&login("alice@example.com", "new-password"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_reset_unknown_email_sends_nothing() {
        let (service, _users, mailer) = fixture();

        service
            .start_password_reset("nobody@example.com")
            .await
            .unwrap();

        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reset_with_tampered_token() {
        let (service, _users, _mailer) = fixture();
        service.register(&registration()).await.unwrap();

        let form = ResetPasswordForm {
            password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        };
        let outcome = service
            .reset_password("definitely.not.valid", &form)
            .await
            .unwrap();
        assert!(matches!(outcome, ResetOutcome::InvalidToken));
    }
}
