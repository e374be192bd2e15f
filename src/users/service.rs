use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::forms::AccountForm;
use super::models::UserModel;
use super::repository::UserRepository;
use crate::media::PictureStore;
use crate::session::CurrentUser;
use crate::shared::AppError;

/// Result of an account update attempt
pub enum AccountOutcome {
    Updated(UserModel),
    Invalid(Vec<String>),
}

/// Service for handling account business logic
pub struct UserService {
    users: Arc<dyn UserRepository + Send + Sync>,
    pictures: Arc<PictureStore>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        pictures: Arc<PictureStore>,
    ) -> Self {
        Self { users, pictures }
    }

    /// Applies the account form for the current user.
    ///
    /// A supplied picture is resized and stored first; without one the stored
    /// picture reference is left untouched. Uniqueness checks exclude the
    /// user's own row so re-submitting unchanged values succeeds.
    #[instrument(skip(self, form), fields(user_id = current.id))]
    pub async fn update_account(
        &self,
        current: &CurrentUser,
        form: &AccountForm,
    ) -> Result<AccountOutcome, AppError> {
        let mut errors = form.validate();

        if let Some(existing) = self.users.find_by_username(&form.username).await? {
            if existing.id != current.id {
                errors.push("That username is already taken.".to_string());
            }
        }
        if let Some(existing) = self.users.find_by_email(&form.email).await? {
            if existing.id != current.id {
                errors.push("That email is already registered.".to_string());
            }
        }
        if !errors.is_empty() {
            return Ok(AccountOutcome::Invalid(errors));
        }

        let image_file = match &form.picture {
            Some(picture) => {
                match self
                    .pictures
                    .save_profile_picture(&picture.data, &picture.filename)
                    .await
                {
                    Ok(filename) => Some(filename),
                    Err(AppError::InvalidImage(reason)) => {
                        warn!(reason = %reason, "Rejected unreadable profile picture");
                        return Ok(AccountOutcome::Invalid(vec![
                            "That image could not be read. Please upload a valid picture."
                                .to_string(),
                        ]));
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        let updated = self
            .users
            .update_account(current.id, &form.username, &form.email, image_file.as_deref())
            .await?;

        info!(user_id = updated.id, "Account updated");
        Ok(AccountOutcome::Updated(updated))
    }
}
