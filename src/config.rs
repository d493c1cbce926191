use std::env;

/// Secret used when `AUTH_SECRET` is not set. Tokens signed with it are forgeable
/// by anyone who has read this file, so running with it is a misconfiguration.
pub const FALLBACK_SECRET: &str = "fallback-secret-change-me";

/// Paths served without any identity check when `PUBLIC_PATHS` is not set.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &["/health", "/favicon.ico", "/robots.txt"];

/// AppConfig
///
/// Holds the gate's entire configuration state. Immutable once loaded and shared
/// with handlers and the gate middleware via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and secret strictness.
    pub env: Env,
    // Shared secret binding session tokens to this deployment.
    pub auth_secret: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Directory holding the static site served to authorized visitors.
    pub site_root: String,
    // JSON file holding the user table.
    pub users_file: String,
    // JSON file holding the group to path-prefix map.
    pub groups_file: String,
    // Exact paths that bypass the gate entirely.
    pub public_paths: Vec<String>,
}

/// Env
///
/// Defines the runtime context: human-readable logs locally, JSON logs and a
/// louder fallback-secret warning in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            auth_secret: "site-gate-test-secret".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            site_root: "site".to_string(),
            users_file: "data/users.json".to_string(),
            groups_file: "data/groups.json".to_string(),
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables. Every variable has a
    /// default; the only value that matters for security is `AUTH_SECRET`, and a
    /// missing one is reported through [`AppConfig::uses_fallback_secret`] rather
    /// than refused.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let auth_secret = env::var("AUTH_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_SECRET.to_string());

        let public_paths = match env::var("PUBLIC_PATHS") {
            Ok(raw) => parse_path_list(&raw),
            Err(_) => DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
        };

        Self {
            env,
            auth_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            site_root: env::var("SITE_ROOT").unwrap_or_else(|_| "site".to_string()),
            users_file: env::var("USERS_FILE").unwrap_or_else(|_| "data/users.json".to_string()),
            groups_file: env::var("GROUPS_FILE")
                .unwrap_or_else(|_| "data/groups.json".to_string()),
            public_paths,
        }
    }

    /// True when tokens are being signed with [`FALLBACK_SECRET`].
    pub fn uses_fallback_secret(&self) -> bool {
        self.auth_secret == FALLBACK_SECRET
    }

    /// True when `path` is on the public allow-list (exact match).
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }
}

fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
