//! Askama template structs for every rendered page, plus small view
//! helpers shared by the handlers.

use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};

use crate::flash::{self, FlashMessage};
use crate::session::CurrentUser;
use crate::shared::AppError;

/// A post prepared for rendering: author resolved to a name and the
/// timestamp already formatted.
#[derive(Debug, Clone)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub author: String,
    pub author_image: String,
    pub created_at: String,
}

/// Public URL of a stored profile picture.
pub fn picture_url(image_file: &str) -> String {
    format!("/static/pics/{image_file}")
}

pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%b %-d, %Y").to_string()
}

/// Renders a template into an HTML response.
///
/// Every rendered page expires the flash cookie, so a notice survives
/// exactly one render.
pub fn render_page<T: Template>(template: &T) -> Result<Response, AppError> {
    let html = template
        .render()
        .map_err(|e| AppError::Template(e.to_string()))?;
    let mut response = Html(html).into_response();
    flash::clear(&mut response);
    Ok(response)
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub posts: Vec<PostView>,
    pub page: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub email: String,
    /// Site-local path to return to after login; empty when absent
    pub next: String,
}

#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
    pub image_url: String,
}

/// Shared by the new-post and edit-post pages; `legend` and `action`
/// distinguish them.
#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub errors: Vec<String>,
    pub legend: String,
    pub action: String,
    pub title_value: String,
    pub body_value: String,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub post: PostView,
    pub is_author: bool,
}

#[derive(Template)]
#[template(path = "user_posts.html")]
pub struct UserPostsTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub username: String,
    pub total: i64,
    pub posts: Vec<PostView>,
    pub page: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Template)]
#[template(path = "reset_request.html")]
pub struct ResetRequestTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub errors: Vec<String>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "reset_password.html")]
pub struct ResetPasswordTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub errors: Vec<String>,
    pub token: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
    pub code: u16,
    pub message: String,
}
