use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::forms::{LoginForm, RegistrationForm, RequestResetForm, ResetPasswordForm};
use super::service::{AuthService, RegisterOutcome, ResetOutcome};
use crate::cookies;
use crate::flash::{self, FlashMessage};
use crate::session::service::SessionService;
use crate::session::CurrentUser;
use crate::shared::{AppError, AppState};
use crate::views::{
    render_page, LoginTemplate, RegisterTemplate, ResetPasswordTemplate, ResetRequestTemplate,
};

/// Query string accepted by the login page
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Redirects home when the request already carries a session; the
/// register/login/reset pages are for anonymous visitors only.
fn redirect_if_logged_in(current_user: &Option<CurrentUser>) -> Option<Response> {
    current_user
        .as_ref()
        .map(|_| Redirect::to("/").into_response())
}

/// Restricts the post-login redirect to site-local paths.
fn sanitize_next(next: Option<&str>) -> Option<String> {
    next.filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .map(str::to_string)
}

/// HTTP handler for the registration page
///
/// GET /register
#[instrument(name = "register_page", skip(current_user, headers))]
pub async fn register_page(
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    let template = RegisterTemplate {
        current_user,
        flashes: flash::take(&headers),
        errors: Vec::new(),
        username: String::new(),
        email: String::new(),
    };
    render_page(&template)
}

/// HTTP handler for creating an account
///
/// POST /register
/// Duplicate username/email or a bad field re-renders the form with errors.
#[instrument(name = "register", skip(state, current_user, headers, form))]
pub async fn register(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    let service = AuthService::from_state(&state);
    match service.register(&form).await? {
        RegisterOutcome::Created(user) => flash::redirect(
            "/login",
            "success",
            &format!("Account created for {}! You can now log in.", user.username),
        ),
        RegisterOutcome::Invalid(errors) => {
            let template = RegisterTemplate {
                current_user,
                flashes: flash::take(&headers),
                errors,
                username: form.username,
                email: form.email,
            };
            render_page(&template)
        }
    }
}

/// HTTP handler for the login page
///
/// GET /login, ?next= carries the page to return to afterwards
#[instrument(name = "login_page", skip(current_user, headers, query))]
pub async fn login_page(
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    let template = LoginTemplate {
        current_user,
        flashes: flash::take(&headers),
        email: String::new(),
        next: sanitize_next(query.next.as_deref()).unwrap_or_default(),
    };
    render_page(&template)
}

/// HTTP handler for logging in
///
/// POST /login
/// Failure re-renders with one generic notice; nothing distinguishes an
/// unknown email from a wrong password.
#[instrument(name = "login", skip(state, current_user, form))]
pub async fn login(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    let service = AuthService::from_state(&state);
    match service.authenticate(&form).await? {
        Some(user) => {
            let sessions = SessionService::new(state.tokens.clone(), Arc::clone(&state.sessions));
            let token = sessions.log_in(user.id, form.remember()).await?;

            let target = sanitize_next(form.next.as_deref()).unwrap_or_else(|| "/".to_string());
            let mut response = flash::redirect(
                &target,
                "success",
                &format!("Welcome back, {}!", user.username),
            )?;
            // Only a remembered session outlives the browser.
            let max_age = form
                .remember()
                .then(|| state.tokens.remember_days * 24 * 60 * 60);
            cookies::set_session(&mut response, &token, max_age)?;

            info!(user_id = user.id, "Login complete");
            Ok(response)
        }
        None => {
            let template = LoginTemplate {
                current_user,
                flashes: vec![FlashMessage::new(
                    "danger",
                    "Login unsuccessful. Please check your email and password.",
                )],
                email: form.email,
                next: form.next.unwrap_or_default(),
            };
            render_page(&template)
        }
    }
}

/// HTTP handler for logging out
///
/// GET /logout
/// Revokes the session row and expires the cookie.
#[instrument(name = "logout", skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = cookies::get(&headers, cookies::SESSION_COOKIE) {
        if let Ok(claims) = state.tokens.validate_session_token(&token) {
            let sessions = SessionService::new(state.tokens.clone(), Arc::clone(&state.sessions));
            sessions.log_out(&claims.session_id).await?;
        }
    }

    info!(user_id = current_user.id, "User logged out");
    let mut response = flash::redirect("/", "info", "You have been logged out.")?;
    cookies::clear_session(&mut response);
    Ok(response)
}

/// HTTP handler for the reset-request page
///
/// GET /reset_password
#[instrument(name = "reset_request_page", skip(current_user, headers))]
pub async fn reset_request_page(
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    let template = ResetRequestTemplate {
        current_user,
        flashes: flash::take(&headers),
        errors: Vec::new(),
        email: String::new(),
    };
    render_page(&template)
}

/// HTTP handler for requesting a password reset
///
/// POST /reset_password
/// The notice is the same whether or not the address matched an account.
#[instrument(name = "reset_request", skip(state, current_user, headers, form))]
pub async fn reset_request(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Form(form): Form<RequestResetForm>,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    let errors = form.validate();
    if !errors.is_empty() {
        let template = ResetRequestTemplate {
            current_user,
            flashes: flash::take(&headers),
            errors,
            email: form.email,
        };
        return render_page(&template);
    }

    let service = AuthService::from_state(&state);
    service.start_password_reset(&form.email).await?;

    flash::redirect(
        "/login",
        "info",
        "If that email is registered, a reset link has been sent to it.",
    )
}

/// HTTP handler for the new-password page behind an emailed link
///
/// GET /reset_password/{token}
#[instrument(name = "reset_token_page", skip(state, current_user, headers, token))]
pub async fn reset_token_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    if state.tokens.validate_reset_token(&token).is_err() {
        return flash::redirect(
            "/reset_password",
            "warning",
            "That reset link is invalid or has expired.",
        );
    }

    let template = ResetPasswordTemplate {
        current_user,
        flashes: flash::take(&headers),
        errors: Vec::new(),
        token,
    };
    render_page(&template)
}

/// HTTP handler for setting the new password
///
/// POST /reset_password/{token}
#[instrument(name = "reset_token", skip(state, current_user, headers, token, form))]
pub async fn reset_token(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    if let Some(response) = redirect_if_logged_in(&current_user) {
        return Ok(response);
    }

    let service = AuthService::from_state(&state);
    match service.reset_password(&token, &form).await? {
        ResetOutcome::Done => flash::redirect(
            "/login",
            "success",
            "Your password has been updated! You can now log in.",
        ),
        ResetOutcome::InvalidToken => flash::redirect(
            "/reset_password",
            "warning",
            "That reset link is invalid or has expired.",
        ),
        ResetOutcome::Invalid(errors) => {
            let template = ResetPasswordTemplate {
                current_user,
                flashes: flash::take(&headers),
                errors,
                token,
            };
            render_page(&template)
        }
    }
}
