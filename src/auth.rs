use axum::http::{HeaderMap, header};

use crate::session::{self, Identity};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "site_gate_session";

/// Lifetime of an issued session cookie (12 hours). The token itself never
/// expires; this is the only validity window.
pub const SESSION_MAX_AGE_SECS: u64 = 43_200;

/// session_token
///
/// Extracts the raw session token from the request's `Cookie` header(s). The
/// first `site_gate_session=` pair wins; an empty value counts as absent.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let prefix = format!("{SESSION_COOKIE_NAME}=");

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| pair.trim().strip_prefix(prefix.as_str()))
        .filter(|token| !token.is_empty())
}

/// authenticated_identity
///
/// Resolves the visitor's identity from the session cookie. Absent cookies and
/// tokens failing verification both yield `None`.
pub fn authenticated_identity(headers: &HeaderMap, secret: &str) -> Option<Identity> {
    let token = session_token(headers)?;
    session::verify(token, secret).ok()
}

/// `Set-Cookie` value installing a freshly issued session token.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={token}; Max-Age={SESSION_MAX_AGE_SECS}; Path=/; HttpOnly; Secure"
    )
}

/// `Set-Cookie` value telling the browser to drop the session immediately.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE_NAME}=; Path=/; Max-Age=0; HttpOnly; Secure")
}
