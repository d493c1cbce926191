use axum::http::{HeaderMap, Method};

use crate::{
    auth,
    config::AppConfig,
    directory::{Directory, GroupPathMap},
    models::UserRecord,
    routes::LOGIN_PATH,
};

/// Members of this group may open every restricted path.
pub const WILDCARD_GROUP: &str = "All";

/// Decision
///
/// Terminal outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<'a> {
    /// Allow-listed path or login submission; forwarded without an identity check.
    Public,
    /// No cookie, or a token that failed verification.
    Unauthenticated,
    /// Token verified, but the account is gone or deactivated. The cookie is revoked.
    StaleIdentity,
    /// Active user whose groups do not cover the path.
    AccessDenied(&'a UserRecord),
    /// Active user allowed to see the path.
    Authorized(&'a UserRecord),
}

/// decide
///
/// Runs the full gate for a request: public bypass, session verification,
/// account freshness, then path authorization.
pub fn decide<'a>(
    config: &AppConfig,
    directory: &'a Directory,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Decision<'a> {
    if config.is_public_path(path) || (*method == Method::POST && path == LOGIN_PATH) {
        return Decision::Public;
    }

    let Some(identity) = auth::authenticated_identity(headers, &config.auth_secret) else {
        return Decision::Unauthenticated;
    };

    let user = match directory.user(&identity.id) {
        Some(user) if user.is_active() => user,
        _ => return Decision::StaleIdentity,
    };

    if is_authorized(user, directory.group_paths(), path) {
        Decision::Authorized(user)
    } else {
        Decision::AccessDenied(user)
    }
}

/// normalize_path
///
/// Canonical form of a request path, as the file server will resolve it.
/// Segments are percent-decoded and empty or `.` segments are dropped. A path
/// ending in `/` or `/.` keeps a trailing `/`. Returns `None` for paths that
/// cannot be expressed safely: `..` segments, invalid UTF-8, and encoded
/// separators or NUL.
pub fn normalize_path(raw: &str) -> Option<String> {
    let mut segments = Vec::new();
    let mut directory = true;
    for segment in raw.split('/') {
        let decoded = urlencoding::decode(segment).ok()?;
        if decoded.contains(['/', '\\', '\0']) {
            return None;
        }
        match decoded.as_ref() {
            "" | "." => directory = true,
            ".." => return None,
            _ => {
                segments.push(decoded);
                directory = false;
            }
        }
    }

    let mut path = String::with_capacity(raw.len());
    for segment in &segments {
        path.push('/');
        path.push_str(segment);
    }
    if directory {
        path.push('/');
    }
    Some(path)
}

/// prefix_matches
///
/// A map entry restricts a path when it equals the path or is a literal prefix
/// of it. `/folder1/` only covers that subtree, while `/folderprotected-` covers
/// every path sharing the text, across segment boundaries.
pub fn prefix_matches(prefix: &str, path: &str) -> bool {
    path == prefix || path.starts_with(prefix)
}

/// Groups with at least one entry matching `path`.
pub fn restricting_groups<'a>(groups: &'a GroupPathMap, path: &str) -> Vec<&'a str> {
    groups
        .iter()
        .filter(|(_, prefixes)| prefixes.iter().any(|p| prefix_matches(p, path)))
        .map(|(group, _)| group.as_str())
        .collect()
}

/// is_authorized
///
/// Default-allow: a path no group restricts is open to every active user.
/// Otherwise the user needs the wildcard group or one of the restricting groups.
pub fn is_authorized(user: &UserRecord, groups: &GroupPathMap, path: &str) -> bool {
    if user.in_group(WILDCARD_GROUP) {
        return true;
    }

    let restricting = restricting_groups(groups, path);
    restricting.is_empty() || restricting.iter().any(|group| user.in_group(group))
}
