//! One-time notices shown on the next rendered page.
//!
//! A notice set alongside a redirect is carried in a short-lived cookie,
//! decoded on the next render and cleared. Categories mirror the styling
//! hooks in the templates: `success`, `info`, `warning`, `danger`.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::cookies;
use crate::shared::AppError;

/// Name of the cookie carrying pending notices
pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashMessage {
    pub category: String,
    pub message: String,
}

impl FlashMessage {
    pub fn new(category: &str, message: &str) -> Self {
        Self {
            category: category.to_string(),
            message: message.to_string(),
        }
    }
}

/// Stores a notice on the response, to be shown by the next rendered page.
pub fn set(response: &mut Response, category: &str, message: &str) -> Result<(), AppError> {
    let payload = serde_json::to_vec(&vec![FlashMessage::new(category, message)])
        .map_err(|e| AppError::Internal(format!("flash encode failed: {e}")))?;
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    let cookie = format!("{FLASH_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Lax; Max-Age=120");
    cookies::append_set_cookie(response, &cookie)
}

/// Reads pending notices off the request. Undecodable cookies are ignored.
pub fn take(headers: &HeaderMap) -> Vec<FlashMessage> {
    let Some(raw) = cookies::get(headers, FLASH_COOKIE) else {
        return Vec::new();
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(raw.as_bytes()) else {
        return Vec::new();
    };
    serde_json::from_slice(&bytes).unwrap_or_default()
}

/// Expires the flash cookie; called after the notices have been rendered.
pub fn clear(response: &mut Response) {
    response.headers_mut().append(
        header::SET_COOKIE,
        HeaderValue::from_static("flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );
}

/// A redirect carrying a one-time notice.
pub fn redirect(to: &str, category: &str, message: &str) -> Result<Response, AppError> {
    let mut response = Redirect::to(to).into_response();
    set(&mut response, category, message)?;
    Ok(response)
}
