//! Minimal cookie helpers.
//!
//! The session token and flash notices travel in plain cookies; parsing and
//! formatting them is small enough to do by hand here rather than pulling in
//! a cookie crate.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;

use crate::shared::AppError;

/// Name of the cookie holding the signed session token
pub const SESSION_COOKIE: &str = "session";

/// Returns the value of the named cookie, if present on the request.
pub fn get(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some((key, value)) = pair.trim().split_once('=') {
                if key == name {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// Attaches the session cookie to a response.
///
/// With `max_age` the cookie outlives the browser session (the remember
/// flag); without it the browser drops the cookie on exit.
pub fn set_session(
    response: &mut Response,
    token: &str,
    max_age: Option<i64>,
) -> Result<(), AppError> {
    let mut cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(seconds) = max_age {
        cookie.push_str(&format!("; Max-Age={seconds}"));
    }
    append_set_cookie(response, &cookie)
}

/// Expires the session cookie on the client.
pub fn clear_session(response: &mut Response) {
    response.headers_mut().append(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );
}

pub fn append_set_cookie(response: &mut Response, cookie: &str) -> Result<(), AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn headers_with_cookie(raw: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static(raw));
        headers
    }

    #[test]
    fn test_get_finds_cookie_among_many() {
        let headers = headers_with_cookie("theme=dark; session=abc.def.ghi; lang=en");
        assert_eq!(get(&headers, "session"), Some("abc.def.ghi".to_string()));
        assert_eq!(get(&headers, "theme"), Some("dark".to_string()));
        assert_eq!(get(&headers, "missing"), None);
    }

    #[test]
    fn test_set_session_with_and_without_max_age() {
        let mut response = ().into_response();
        set_session(&mut response, "tok", Some(3600)).unwrap();
        set_session(&mut response, "tok", None).unwrap();

        let values: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(values[0].contains("Max-Age=3600"));
        assert!(!values[1].contains("Max-Age"));
        assert!(values.iter().all(|v| v.contains("HttpOnly")));
    }
}
