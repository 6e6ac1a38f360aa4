use std::{env, time::Duration};

use crate::util::env_u64;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const ENDPOINT_ENV: &str = "DDB_ENDPOINT";
pub const LISTING_TIMEOUT_ENV: &str = "DUI_SCAN_TIMEOUT_MS";
pub const DEFAULT_LISTING_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_EDITOR: &str = "vim";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub table: Option<String>,
    /// Upper bound for a whole scan or query, across all pages.
    pub listing_timeout: Duration,
    pub editor: String,
}

impl Config {
    pub fn load(endpoint_flag: Option<&str>, table: Option<String>) -> Self {
        let endpoint = resolve_endpoint(endpoint_flag, env::var(ENDPOINT_ENV).ok().as_deref());
        let listing_timeout = env_u64(LISTING_TIMEOUT_ENV)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_LISTING_TIMEOUT);
        Self {
            endpoint,
            table: table.filter(|name| !name.is_empty()),
            listing_timeout,
            editor: resolve_editor(env::var("EDITOR").ok()),
        }
    }
}

/// Flag first, then the environment, then the local default.
pub fn resolve_endpoint(flag: Option<&str>, env_value: Option<&str>) -> String {
    [flag, env_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_ENDPOINT)
        .to_string()
}

fn resolve_editor(value: Option<String>) -> String {
    value
        .filter(|editor| !editor.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_priority() {
        assert_eq!(
            resolve_endpoint(Some("http://flag:1"), Some("http://env:2")),
            "http://flag:1"
        );
        assert_eq!(resolve_endpoint(None, Some("http://env:2")), "http://env:2");
        assert_eq!(resolve_endpoint(Some(""), Some("http://env:2")), "http://env:2");
        assert_eq!(resolve_endpoint(None, None), DEFAULT_ENDPOINT);
        assert_eq!(resolve_endpoint(None, Some("  ")), DEFAULT_ENDPOINT);
    }

    #[test]
    fn editor_falls_back_to_vim() {
        assert_eq!(resolve_editor(None), "vim");
        assert_eq!(resolve_editor(Some(String::new())), "vim");
        assert_eq!(resolve_editor(Some("nano -w".to_string())), "nano -w");
    }
}
