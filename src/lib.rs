use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session codec and the cookie carrying it.
pub mod auth;
pub mod session;

// Authorization decision and the immutable data it runs on.
pub mod access;
pub mod directory;
pub mod models;

// Request handling, downstream content and response shaping.
pub mod config;
pub mod handlers;
pub mod resolver;
pub mod rewrite;
pub mod templates;

pub mod routes;
use routes::{public, site};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use directory::{Directory, DirectoryState};
pub use resolver::{MockContentResolver, ResolverState, StaticSiteResolver};

/// AppState
///
/// Everything a request needs, shared across all requests. Nothing in it is
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Immutable user table and group map.
    pub directory: DirectoryState,
    /// Downstream content for public and authorized requests.
    pub resolver: ResolverState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Handlers and the gate middleware pull only the parts of AppState they use.

impl FromRef<AppState> for DirectoryState {
    fn from_ref(app_state: &AppState) -> DirectoryState {
        app_state.directory.clone()
    }
}

impl FromRef<AppState> for ResolverState {
    fn from_ref(app_state: &AppState) -> ResolverState {
        app_state.resolver.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gate's routes and the site fallback, wraps all of them in the
/// gate middleware, and adds request-id and tracing layers outermost.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 1. Base Router Assembly
    // Gate endpoints plus the site fallback, all behind the gate middleware.
    let base_router = Router::new()
        .merge(public::public_routes())
        .merge(site::site_routes())
        // Every request, including ones to the gate's own routes, is classified first.
        .layer(middleware::from_fn_with_state(state.clone(), handlers::gate))
        .with_state(state);

    // 2. Global Layers
    // Order matters: the id is set first so the trace span and the response
    // both carry it.
    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Span for one request, correlated by the `x-request-id` set above. The
/// query string is left out so `?error=` markers and form redirects stay out of
/// the logs; cookies are never recorded.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
