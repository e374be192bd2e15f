use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt; // for `oneshot`

/// Issues a GET request, optionally attaching a cookie header.
pub async fn get(app: &Router, path: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Issues a urlencoded form POST.
pub async fn post_form(app: &Router, path: &str, body: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Issues a multipart form POST with plain text fields.
pub async fn post_multipart(
    app: &Router,
    path: &str,
    fields: &[(&str, &str)],
    cookie: Option<&str>,
) -> Response {
    let boundary = "------------------------inkposttestboundary";
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::from(body)).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Extracts the `name=value` pair of a cookie set by the response, ignoring
/// deletions (empty values).
pub fn cookie_pair(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for value in response.headers().get_all(header::SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        if let Some(rest) = raw.strip_prefix(&prefix) {
            let cookie_value = rest.split(';').next().unwrap_or_default();
            if !cookie_value.is_empty() {
                return Some(format!("{name}={cookie_value}"));
            }
        }
    }
    None
}

/// Location header of a redirect response.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Registers an account and logs in, returning the session cookie to attach
/// to subsequent requests.
pub async fn register_and_login(
    app: &Router,
    username: &str,
    email: &str,
    password: &str,
) -> String {
    let register_body = format!(
        "username={username}&email={email}&password={password}&confirm_password={password}"
    );
    let response = post_form(app, "/register", &register_body, None).await;
    assert_eq!(
        response.status(),
        axum::http::StatusCode::SEE_OTHER,
        "registration should redirect to login"
    );

    let login_body = format!("email={email}&password={password}");
    let response = post_form(app, "/login", &login_body, None).await;
    assert_eq!(
        response.status(),
        axum::http::StatusCode::SEE_OTHER,
        "login should redirect"
    );

    cookie_pair(&response, "session").expect("login should set a session cookie")
}

/// Creates a post through the HTTP surface.
pub async fn create_post(app: &Router, cookie: &str, title: &str, body: &str) -> Response {
    let form = format!("title={title}&body={body}");
    post_form(app, "/new/post", &form, Some(cookie)).await
}
