use crate::{AppState, handlers};
use axum::Router;

/// Site Router Module
///
/// Every path not claimed by the gate's own routes is site content. Which of
/// those requests get this far is decided by the gate middleware.
pub fn site_routes() -> Router<AppState> {
    Router::new().fallback(handlers::serve_site)
}
