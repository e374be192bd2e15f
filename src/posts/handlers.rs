use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Extension, Form};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use super::forms::PostForm;
use super::models::PostModel;
use super::service::{PostOutcome, PostService};
use crate::session::CurrentUser;
use crate::shared::{AppError, AppState};
use crate::views::{
    self, render_page, IndexTemplate, PostFormTemplate, PostTemplate, PostView, UserPostsTemplate,
};
use crate::flash;

/// Query string for paginated listings
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// Page number, defaulting to 1 for anything missing or unparseable.
    pub fn page_number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1)
    }
}

/// HTTP handler for the home feed
///
/// GET / and GET /index, ?page= selects the page
#[instrument(name = "index", skip(state, current_user, headers, query))]
pub async fn index(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let page = query.page_number();

    let service = PostService::new(Arc::clone(&state.posts));
    let listing = service.home_page(page).await?;

    let template = IndexTemplate {
        current_user,
        flashes: flash::take(&headers),
        posts: to_views(&state, &listing.items).await?,
        page: listing.page,
        has_prev: listing.has_prev(),
        has_next: listing.has_next(),
    };
    render_page(&template)
}

/// HTTP handler for a single post
///
/// GET /post/{id}, 404 when the id is unknown
#[instrument(name = "view_post", skip(state, current_user, headers))]
pub async fn view_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let service = PostService::new(Arc::clone(&state.posts));
    let post = service.get(id).await?;

    let is_author = current_user
        .as_ref()
        .is_some_and(|user| user.id == post.author_id);
    let resolved = to_views(&state, std::slice::from_ref(&post)).await?;
    let Some(view) = resolved.into_iter().next() else {
        return Err(AppError::Internal("post view resolution failed".to_string()));
    };

    let template = PostTemplate {
        current_user,
        flashes: flash::take(&headers),
        post: view,
        is_author,
    };
    render_page(&template)
}

/// HTTP handler for the new-post form
///
/// GET /new/post
#[instrument(name = "new_post_page", skip(current_user, headers))]
pub async fn new_post_page(
    Extension(current_user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let template = PostFormTemplate {
        current_user: Some(current_user),
        flashes: flash::take(&headers),
        errors: Vec::new(),
        legend: "New Post".to_string(),
        action: "/new/post".to_string(),
        title_value: String::new(),
        body_value: String::new(),
    };
    render_page(&template)
}

/// HTTP handler for creating a post
///
/// POST /new/post
/// A failed validation re-renders the form with the submitted values.
#[instrument(name = "create_post", skip(state, current_user, headers, form))]
pub async fn create_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    headers: HeaderMap,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let service = PostService::new(Arc::clone(&state.posts));

    match service.create(current_user.id, &form).await? {
        PostOutcome::Saved(post) => {
            info!(post_id = post.id, "Post accepted");
            flash::redirect("/", "success", "Your post has been created!")
        }
        PostOutcome::Invalid(errors) => {
            let template = PostFormTemplate {
                current_user: Some(current_user),
                flashes: flash::take(&headers),
                errors,
                legend: "New Post".to_string(),
                action: "/new/post".to_string(),
                title_value: form.title,
                body_value: form.body,
            };
            render_page(&template)
        }
    }
}

/// HTTP handler for the edit-post form
///
/// GET /update/{id}/post, pre-filled; 404/403 as for mutations
#[instrument(name = "edit_post_page", skip(state, current_user, headers))]
pub async fn edit_post_page(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let service = PostService::new(Arc::clone(&state.posts));
    let post = service.get_owned(id, current_user.id).await?;

    let template = PostFormTemplate {
        current_user: Some(current_user),
        flashes: flash::take(&headers),
        errors: Vec::new(),
        legend: "Update Post".to_string(),
        action: format!("/update/{id}/post"),
        title_value: post.title,
        body_value: post.body,
    };
    render_page(&template)
}

/// HTTP handler for updating a post
///
/// POST /update/{id}/post, author only
#[instrument(name = "update_post", skip(state, current_user, headers, form))]
pub async fn update_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<Response, AppError> {
    let service = PostService::new(Arc::clone(&state.posts));

    match service.update(id, current_user.id, &form).await? {
        PostOutcome::Saved(post) => flash::redirect(
            &format!("/post/{}", post.id),
            "success",
            "Your post has been updated!",
        ),
        PostOutcome::Invalid(errors) => {
            let template = PostFormTemplate {
                current_user: Some(current_user),
                flashes: flash::take(&headers),
                errors,
                legend: "Update Post".to_string(),
                action: format!("/update/{id}/post"),
                title_value: form.title,
                body_value: form.body,
            };
            render_page(&template)
        }
    }
}

/// HTTP handler for deleting a post
///
/// POST /delete/{id}/post, author only
#[instrument(name = "delete_post", skip(state, current_user))]
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let service = PostService::new(Arc::clone(&state.posts));
    service.delete(id, current_user.id).await?;

    flash::redirect("/", "success", "Your post has been deleted!")
}

/// HTTP handler for one author's feed
///
/// GET /user_post/{username}, ?page= selects the page; 404 for an unknown
/// username
#[instrument(name = "user_posts", skip(state, current_user, headers, query))]
pub async fn user_posts(
    State(state): State<AppState>,
    Extension(current_user): Extension<Option<CurrentUser>>,
    headers: HeaderMap,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    let service = PostService::new(Arc::clone(&state.posts));
    let listing = service.author_page(author.id, query.page_number()).await?;

    let template = UserPostsTemplate {
        current_user,
        flashes: flash::take(&headers),
        username: author.username,
        total: listing.total,
        posts: to_views(&state, &listing.items).await?,
        page: listing.page,
        has_prev: listing.has_prev(),
        has_next: listing.has_next(),
    };
    render_page(&template)
}

/// Resolves author names and formats timestamps for rendering. Authors are
/// looked up once per distinct id.
async fn to_views(state: &AppState, posts: &[PostModel]) -> Result<Vec<PostView>, AppError> {
    let mut authors: HashMap<i64, (String, String)> = HashMap::new();
    let mut post_views = Vec::with_capacity(posts.len());

    for post in posts {
        if !authors.contains_key(&post.author_id) {
            // A post's author always resolves; a miss means the store broke
            // referential integrity.
            let author = state.users.get_by_id(post.author_id).await?.ok_or_else(|| {
                AppError::Internal(format!("author {} missing for post {}", post.author_id, post.id))
            })?;
            authors.insert(post.author_id, (author.username, author.image_file));
        }
        let (username, image_file) = &authors[&post.author_id];

        post_views.push(PostView {
            id: post.id,
            title: post.title.clone(),
            body: post.body.clone(),
            author: username.clone(),
            author_image: image_file.clone(),
            created_at: views::format_date(&post.created_at),
        });
    }

    Ok(post_views)
}
