use serial_test::serial;
use site_gate::{
    AppConfig,
    config::{DEFAULT_PUBLIC_PATHS, Env, FALLBACK_SECRET},
};
use std::{env, panic};

const CONFIG_VARS: &[&str] = &[
    "APP_ENV",
    "AUTH_SECRET",
    "BIND_ADDR",
    "SITE_ROOT",
    "USERS_FILE",
    "GROUPS_FILE",
    "PUBLIC_PATHS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with exactly `vars` set (all other config variables removed) and
/// restores the previous environment afterwards.
fn run_with_env<T, R>(vars: &[(&str, &str)], test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_defaults_without_environment() {
    let config = run_with_env(&[], AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.site_root, "site");
    assert_eq!(config.users_file, "data/users.json");
    assert_eq!(config.groups_file, "data/groups.json");
    assert_eq!(config.public_paths, DEFAULT_PUBLIC_PATHS);
}

#[test]
#[serial]
fn test_missing_secret_falls_back_and_is_detectable() {
    let config = run_with_env(&[("APP_ENV", "production")], AppConfig::load);

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.auth_secret, FALLBACK_SECRET);
    assert!(config.uses_fallback_secret());
}

#[test]
#[serial]
fn test_empty_secret_counts_as_missing() {
    let config = run_with_env(&[("AUTH_SECRET", "")], AppConfig::load);

    assert!(config.uses_fallback_secret());
}

#[test]
#[serial]
fn test_explicit_values_are_used() {
    let config = run_with_env(
        &[
            ("AUTH_SECRET", "a-real-secret"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("PUBLIC_PATHS", " /health , /assets/logo.png,, "),
        ],
        AppConfig::load,
    );

    assert!(!config.uses_fallback_secret());
    assert_eq!(config.auth_secret, "a-real-secret");
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
    assert_eq!(config.public_paths, vec!["/health", "/assets/logo.png"]);
    assert!(config.is_public_path("/assets/logo.png"));
    // Exact match only.
    assert!(!config.is_public_path("/assets/logo.png/x"));
}
