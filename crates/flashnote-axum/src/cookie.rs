//! Session-id cookie plumbing.

use axum::http::{header::COOKIE, HeaderMap};
use uuid::Uuid;

/// Generate a fresh session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Pull a named cookie value out of the request headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

/// Render the `Set-Cookie` value for a newly issued session id.
pub fn set_cookie_value(name: &str, session_id: &str) -> String {
    format!("{name}={session_id}; Path=/; HttpOnly; SameSite=Lax")
}
