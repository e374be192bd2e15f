use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Extension;
use std::sync::Arc;
use tracing::{info, instrument};

use super::forms::{AccountForm, UploadedPicture};
use super::service::{AccountOutcome, UserService};
use crate::session::CurrentUser;
use crate::shared::{AppError, AppState};
use crate::views::{render_page, AccountTemplate};
use crate::{flash, views};

/// HTTP handler for the account settings page
///
/// GET /account
/// Pre-fills the form with the current username and email.
#[instrument(name = "account_page", skip(headers))]
pub async fn account_page(
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let template = AccountTemplate {
        flashes: flash::take(&headers),
        username: user.username.clone(),
        email: user.email.clone(),
        image_url: views::picture_url(&user.image_file),
        errors: Vec::new(),
        current_user: Some(user),
    };
    render_page(&template)
}

/// HTTP handler for updating the account
///
/// POST /account (multipart: username, email, optional picture)
/// A supplied picture is resized and stored; the reference on the user row
/// only changes when a picture was actually uploaded.
#[instrument(name = "update_account", skip(state, headers, multipart))]
pub async fn update_account(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_account_form(multipart).await?;

    let service = UserService::new(Arc::clone(&state.users), Arc::clone(&state.pictures));
    match service.update_account(&user, &form).await? {
        AccountOutcome::Updated(updated) => {
            info!(user_id = updated.id, "Account update accepted");
            flash::redirect("/account", "success", "Your account has been updated!")
        }
        AccountOutcome::Invalid(errors) => {
            let template = AccountTemplate {
                flashes: flash::take(&headers),
                username: form.username,
                email: form.email,
                image_url: views::picture_url(&user.image_file),
                errors,
                current_user: Some(user),
            };
            render_page(&template)
        }
    }
}

/// Pulls the account fields out of the multipart body. An empty file part
/// counts as "no picture supplied".
async fn read_account_form(mut multipart: Multipart) -> Result<AccountForm, AppError> {
    let mut form = AccountForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("username") => {
                form.username = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?
                    .trim()
                    .to_string();
            }
            Some("email") => {
                form.email = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("malformed form: {e}")))?
                    .trim()
                    .to_string();
            }
            Some("picture") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("malformed upload: {e}")))?;
                if !data.is_empty() {
                    form.picture = Some(UploadedPicture {
                        filename,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}
