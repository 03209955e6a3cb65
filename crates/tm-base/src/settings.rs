//! Runtime settings: compile-time defaults overridden by environment variables.
//!
//! `.env` in the working directory is honoured (loaded with dotenvy) so a
//! backend URL can be pinned per checkout without exporting anything.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::constants::{
    DEFAULT_BACKEND_URL, ERRORS_DIR, HISTORY_DIR, LOG_FILE, LOGS_DIR, PENDING_TIMEOUT_SECS, POLL_INTERVAL_SECS,
    REQUEST_TIMEOUT_SECS, STORE_DIR,
};

pub const ENV_BACKEND_URL: &str = "TUBEMATE_BACKEND_URL";
pub const ENV_STORE_DIR: &str = "TUBEMATE_STORE_DIR";
pub const ENV_POLL_INTERVAL_SECS: &str = "TUBEMATE_POLL_INTERVAL_SECS";
pub const ENV_PENDING_TIMEOUT_SECS: &str = "TUBEMATE_PENDING_TIMEOUT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TUBEMATE_REQUEST_TIMEOUT_SECS";
pub const ENV_EXPIRY: &str = "TUBEMATE_EXPIRY";

/// What happens to the placeholder message when its pending query expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Rewrite the placeholder to the configured timeout notice.
    #[default]
    RewritePlaceholder,
    /// Leave the "still analyzing" text in place.
    LeavePlaceholder,
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rewrite" => Ok(ExpiryPolicy::RewritePlaceholder),
            "leave" => Ok(ExpiryPolicy::LeavePlaceholder),
            other => Err(format!("unknown expiry policy '{}' (expected 'rewrite' or 'leave')", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: String,
    pub store_dir: PathBuf,
    pub poll_interval: Duration,
    pub pending_timeout: Duration,
    pub request_timeout: Duration,
    pub expiry_policy: ExpiryPolicy,
    /// Overrides that were ignored, kept so they can be logged once logging is up
    pub rejected: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            store_dir: PathBuf::from(STORE_DIR),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            pending_timeout: Duration::from_secs(PENDING_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            expiry_policy: ExpiryPolicy::default(),
            rejected: Vec::new(),
        }
    }
}

impl Settings {
    /// Load `.env` (if any) and read overrides from the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup. Invalid values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            settings.backend_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup(ENV_STORE_DIR).filter(|v| !v.trim().is_empty()) {
            settings.store_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_secs(&lookup, ENV_POLL_INTERVAL_SECS, &mut settings.rejected) {
            settings.poll_interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, ENV_PENDING_TIMEOUT_SECS, &mut settings.rejected) {
            settings.pending_timeout = secs;
        }
        if let Some(secs) = parse_secs(&lookup, ENV_REQUEST_TIMEOUT_SECS, &mut settings.rejected) {
            settings.request_timeout = secs;
        }
        if let Some(raw) = lookup(ENV_EXPIRY) {
            match raw.parse() {
                Ok(policy) => settings.expiry_policy = policy,
                Err(e) => settings.rejected.push(format!("{}: {}", ENV_EXPIRY, e)),
            }
        }

        settings
    }

    /// Record the effective settings. Call after the tracing subscriber is installed.
    pub fn log_summary(&self) {
        for rejection in &self.rejected {
            tracing::warn!("{}", rejection);
        }
        tracing::info!(
            backend = %self.backend_url,
            store = %self.store_dir.display(),
            poll_interval_secs = self.poll_interval.as_secs(),
            pending_timeout_secs = self.pending_timeout.as_secs(),
            request_timeout_secs = self.request_timeout.as_secs(),
            expiry = ?self.expiry_policy,
            "settings loaded"
        );
    }

    pub fn history_dir(&self) -> PathBuf {
        self.store_dir.join(HISTORY_DIR)
    }

    pub fn log_path(&self) -> PathBuf {
        self.store_dir.join(LOGS_DIR).join(LOG_FILE)
    }

    pub fn errors_dir(&self) -> PathBuf {
        self.store_dir.join(ERRORS_DIR)
    }
}

/// Positive whole seconds; zero or garbage is rejected.
fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, rejected: &mut Vec<String>) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            rejected.push(format!("{}: ignoring invalid value '{}'", key, raw));
            None
        }
    }
}
