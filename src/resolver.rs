use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tower::ServiceExt;
use tower_http::services::ServeDir;

// 1. ContentResolver Contract
/// ContentResolver
///
/// The downstream collaborator the gate forwards public and authorized requests
/// to. Responses are opaque to the gate apart from their `content-type`.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn resolve(&self, request: Request) -> Response;
}

// 2. The Real Implementation (static files on disk)
/// StaticSiteResolver
///
/// Serves the site root through `tower_http`'s `ServeDir`, which streams file
/// bodies and maps directories to their `index.html`.
#[derive(Clone)]
pub struct StaticSiteResolver {
    dir: ServeDir,
}

impl StaticSiteResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            dir: ServeDir::new(root.into()).append_index_html_on_directories(true),
        }
    }
}

#[async_trait]
impl ContentResolver for StaticSiteResolver {
    async fn resolve(&self, request: Request) -> Response {
        match self.dir.clone().oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockContentResolver
///
/// Serves canned `(content-type, body)` pairs keyed by exact path; anything else
/// is a 404.
#[derive(Clone, Default)]
pub struct MockContentResolver {
    pages: HashMap<String, (String, String)>,
}

impl MockContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(
        mut self,
        path: impl Into<String>,
        content_type: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        self.pages
            .insert(path.into(), (content_type.into(), body.into()));
        self
    }
}

#[async_trait]
impl ContentResolver for MockContentResolver {
    async fn resolve(&self, request: Request) -> Response {
        match self.pages.get(request.uri().path()) {
            Some((content_type, body)) => (
                [(header::CONTENT_TYPE, content_type.clone())],
                body.clone(),
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// ResolverState
///
/// The shared handle stored in the application state.
pub type ResolverState = Arc<dyn ContentResolver>;
