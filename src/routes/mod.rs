/// Router Module Index
///
/// Splits routing into the gate's own endpoints and the site it protects. The
/// gate middleware wraps both, so the split is about ownership, not access:
/// whether a request reaches a handler is decided by `access::decide`.

/// Path of the login/logout endpoint. `POST`s to it bypass the gate.
pub const LOGIN_PATH: &str = "/_gate/login";

/// Endpoints owned by the gate itself (login, health).
pub mod public;

/// Fallback forwarding everything else to the content resolver.
pub mod site;
