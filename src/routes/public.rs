use super::LOGIN_PATH;
use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints answered by the gate itself rather than by the site.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check. On the default public allow-list, so it never needs a session.
        .route("/health", get(|| async { "ok" }))
        // POST /_gate/login[?logout=1]
        // Credential check and session issuance, or logout.
        .route(LOGIN_PATH, post(handlers::login))
}
