use crate::{
    access::{self, Decision},
    auth,
    config::AppConfig,
    directory::DirectoryState,
    models::{GateQuery, LoginForm, LoginNotice, LoginQuery},
    resolver::ResolverState,
    rewrite, session,
    templates::{self, GatePage},
};
use axum::{
    Form,
    extract::{Query, Request, State, rejection::FormRejection},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};

// --- Gate Middleware ---

/// gate
///
/// Wraps the whole router. The path is normalized first so the decision is
/// made on the same path the file server resolves. Every request is then
/// classified by [`access::decide`] and either forwarded, answered with a gate
/// page, or forwarded and then rewritten.
pub async fn gate(
    State(config): State<AppConfig>,
    State(directory): State<DirectoryState>,
    request: Request,
    next: Next,
) -> Response {
    // 1. Path Normalization
    // Decide on the path the file server will resolve; `..` and encoded separators are refused.
    let Some(path) = access::normalize_path(request.uri().path()) else {
        tracing::warn!(
            raw_path = %request.uri().path(),
            "unresolvable request path, rejecting"
        );
        let mut response = StatusCode::BAD_REQUEST.into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        return response;
    };

    // 2. Classification
    let decision = access::decide(
        &config,
        &directory,
        request.method(),
        &path,
        request.headers(),
    );

    // 3. Response per outcome
    match decision {
        Decision::Public => {
            tracing::debug!(%path, "public path, passing through");
            next.run(request).await
        }
        Decision::Unauthenticated => {
            tracing::debug!(%path, "no valid session, showing login");
            let query = Query::<GateQuery>::try_from_uri(request.uri())
                .map(|Query(q)| q)
                .unwrap_or_default();
            let notice = LoginNotice::from_query(query.error.as_deref());
            gate_page(GatePage::Login {
                redirect_path: &path,
                notice,
            })
        }
        Decision::StaleIdentity => {
            tracing::info!(%path, "session refers to a missing or inactive user, revoking");
            let mut response = gate_page(GatePage::Login {
                redirect_path: &path,
                notice: Some(LoginNotice::UnknownUser),
            });
            set_cookie(&mut response, &auth::clear_session_cookie());
            response
        }
        Decision::AccessDenied(user) => {
            tracing::info!(%path, user_id = %user.id, "access denied");
            gate_page(GatePage::AccessDenied {
                surname: &user.surname,
            })
        }
        Decision::Authorized(user) => {
            tracing::debug!(%path, user_id = %user.id, "authorized");
            let user = user.clone();
            let response = next.run(request).await;
            rewrite::decorate_authorized(response, &user)
        }
    }
}

/// Gate pages are always HTML and never cached.
fn gate_page(page: GatePage<'_>) -> Response {
    let mut response = Html(templates::render(page)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

fn set_cookie(response: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// 302 to `location`, optionally setting a cookie.
fn redirect(location: &str, cookie: Option<String>) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(header::LOCATION, value);
        }
        Err(_) => {
            headers.insert(header::LOCATION, HeaderValue::from_static("/"));
        }
    }
    if let Some(cookie) = cookie {
        set_cookie(&mut response, &cookie);
    }
    response
}

/// safe_redirect_path
///
/// Only local absolute paths are followed after login; anything else,
/// including protocol-relative `//host` forms, falls back to `/`.
pub fn safe_redirect_path(raw: Option<&str>) -> &str {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

// --- Handlers ---

/// login
///
/// [Public Route] `POST` login endpoint. `?logout=1` always clears the
/// session. Otherwise the posted surname and member number are checked against
/// the user table; every outcome is a 302 so the browser lands back on a page
/// that can explain it.
pub async fn login(
    State(config): State<AppConfig>,
    State(directory): State<DirectoryState>,
    Query(query): Query<LoginQuery>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    if query.logout.as_deref() == Some("1") {
        tracing::debug!("logout requested");
        return redirect("/", Some(auth::clear_session_cookie()));
    }

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable login form, treating as empty");
            LoginForm::default()
        }
    };

    let surname = form.surname.as_deref().unwrap_or_default().trim();
    let id_number = form.id_number.as_deref().unwrap_or_default().trim();
    let redirect_path = safe_redirect_path(form.redirect.as_deref());

    if surname.is_empty() || id_number.is_empty() {
        return redirect(&format!("{redirect_path}?error=empty"), None);
    }

    match directory.authenticate(id_number, surname) {
        Some(user) => {
            tracing::info!(user_id = %user.id, "login succeeded");
            let token = session::issue(&user.id, &user.surname, &config.auth_secret);
            redirect(redirect_path, Some(auth::session_cookie(&token)))
        }
        None => {
            tracing::warn!(user_id = %id_number, "login failed");
            redirect(&format!("{redirect_path}?error=1"), None)
        }
    }
}

/// serve_site
///
/// [Fallback] Hands the request to the content resolver.
pub async fn serve_site(State(resolver): State<ResolverState>, request: Request) -> Response {
    resolver.resolve(request).await
}
