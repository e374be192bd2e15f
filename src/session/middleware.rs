use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::service::SessionService;
use crate::cookies;
use crate::flash;
use crate::shared::{AppError, AppState};

/// Resolved identity of the requesting user, stored in request extensions.
///
/// This is the request-scoped replacement for any ambient "current user"
/// state: handlers receive it explicitly via `Extension`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub image_file: String,
}

/// Session-resolution middleware applied to every route.
///
/// Resolves the session cookie to `Option<CurrentUser>` and stores it in the
/// request extensions; a missing, invalid or revoked session simply yields
/// `None` here. Enforcement happens in [`require_login`].
#[instrument(skip(state, req, next))]
pub async fn load_current_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = resolve_user(&state, req.headers()).await;
    if let Some(user) = &user {
        debug!(user_id = user.id, username = %user.username, "Resolved session cookie to user");
    }
    req.extensions_mut().insert::<Option<CurrentUser>>(user);
    next.run(req).await
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Option<CurrentUser> {
    let token = cookies::get(headers, cookies::SESSION_COOKIE)?;

    let service = SessionService::new(state.tokens.clone(), Arc::clone(&state.sessions));
    let claims = service.validate(&token).await.ok()?;

    let user = state.users.get_by_id(claims.user_id).await.ok()??;
    Some(CurrentUser {
        id: user.id,
        username: user.username,
        email: user.email,
        image_file: user.image_file,
    })
}

/// Login guard applied to routes that require an authenticated user.
///
/// Re-inserts the concrete `CurrentUser` extension for handlers; anonymous
/// requests are redirected to the login page with a notice.
#[instrument(skip(req, next))]
pub async fn require_login(mut req: Request, next: Next) -> Result<Response, AppError> {
    match req
        .extensions()
        .get::<Option<CurrentUser>>()
        .cloned()
        .flatten()
    {
        Some(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        None => {
            debug!(uri = %req.uri(), "Anonymous request to guarded route");
            flash::redirect("/login", "info", "Please log in to access that page.")
        }
    }
}
