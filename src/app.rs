//! Route table and the couple of static pages that need no module of
//! their own.

use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{middleware, Extension, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::session::{self, CurrentUser};
use crate::shared::{AppError, AppState};
use crate::views::{render_page, AboutTemplate};
use crate::{auth, flash, posts, users};

/// Builds the full application router.
///
/// Guarded routes sit behind [`session::require_login`]; every route gets
/// [`session::load_current_user`] so handlers and templates can see who is
/// asking.
pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route(
            "/account",
            get(users::handlers::account_page).post(users::handlers::update_account),
        )
        .route(
            "/new/post",
            get(posts::handlers::new_post_page).post(posts::handlers::create_post),
        )
        .route(
            "/update/:id/post",
            get(posts::handlers::edit_post_page).post(posts::handlers::update_post),
        )
        .route("/delete/:id/post", post(posts::handlers::delete_post))
        .route("/logout", get(auth::handlers::logout))
        .route_layer(middleware::from_fn(session::require_login));

    Router::new()
        .route("/", get(posts::handlers::index))
        .route("/index", get(posts::handlers::index))
        .route("/about", get(about))
        .route(
            "/register",
            get(auth::handlers::register_page).post(auth::handlers::register),
        )
        .route(
            "/login",
            get(auth::handlers::login_page).post(auth::handlers::login),
        )
        .route("/post/:id", get(posts::handlers::view_post))
        .route("/user_post/:username", get(posts::handlers::user_posts))
        .route(
            "/reset_password",
            get(auth::handlers::reset_request_page).post(auth::handlers::reset_request),
        )
        .route(
            "/reset_password/:token",
            get(auth::handlers::reset_token_page).post(auth::handlers::reset_token),
        )
        .merge(guarded)
        .nest_service("/static", ServeDir::new(state.config.static_dir.clone()))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::load_current_user,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /about
async fn about(
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let template = AboutTemplate {
        current_user,
        flashes: flash::take(&headers),
    };
    render_page(&template)
}

/// Fallback for unmatched routes
async fn not_found() -> AppError {
    AppError::NotFound("Page".to_string())
}
