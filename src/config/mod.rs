//! Settings for an update run.
//!
//! The settings file is a list of `KEY=value` lines (see [`parser`]). It is
//! read once at startup into an immutable [`Config`] which is then passed by
//! reference to every stage, so no stage reads ambient environment state.
//!
//! # Required keys
//!
//! | Key | Needed when |
//! |-----|-------------|
//! | `IMMICH_API_KEY`, `DOCKER_BIN`, `IMMICH_DIR`, `IMMICH_HOST`, `NOTIFY_METHOD` | always |
//! | `EMAIL_TO` | `NOTIFY_METHOD=email` |
//! | `GOTIFY_URL`, `GOTIFY_TOKEN` | `NOTIFY_METHOD=gotify` |
//!
//! Everything else has a default from [`crate::constants`]. Validation is
//! complete before any network call is made.

pub mod parser;

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use strsim::levenshtein;
use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_COMPOSE_TIMEOUT, DEFAULT_HTTP_TIMEOUT, DEFAULT_MIN_RELEASE_AGE_DAYS,
    DEFAULT_PRUNE_AGE_HOURS, DEFAULT_READY_INTERVAL, DEFAULT_READY_TIMEOUT, DEFAULT_RELEASE_URL,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY, DEFAULT_STATUS_PATH,
};
use crate::core::UpdaterError;
use crate::notify::email::parse_mailbox;
use crate::utils::retry::RetryPolicy;
use parser::Entries;

/// Default sender for e-mail notifications.
pub const DEFAULT_EMAIL_FROM: &str = "immich-autoupdate@localhost";

/// Every key the loader understands. Anything else gets a warning.
pub const KNOWN_KEYS: &[&str] = &[
    "IMMICH_API_KEY",
    "DOCKER_BIN",
    "IMMICH_DIR",
    "IMMICH_HOST",
    "NOTIFY_METHOD",
    "EMAIL_TO",
    "EMAIL_FROM",
    "GOTIFY_URL",
    "GOTIFY_TOKEN",
    "RELEASE_URL",
    "STATUS_PATH",
    "MIN_RELEASE_AGE_DAYS",
    "HTTP_TIMEOUT_SECS",
    "RETRY_ATTEMPTS",
    "RETRY_DELAY_SECS",
    "READY_TIMEOUT_SECS",
    "READY_INTERVAL_SECS",
    "COMPOSE_TIMEOUT_SECS",
    "PRUNE_IMAGES",
    "PRUNE_AGE_HOURS",
];

const ALWAYS_REQUIRED: &[&str] =
    &["IMMICH_API_KEY", "DOCKER_BIN", "IMMICH_DIR", "IMMICH_HOST", "NOTIFY_METHOD"];

/// Notification transport selected by `NOTIFY_METHOD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyTransport {
    /// Notifications disabled
    None,
    /// Plain-text mail through the local sendmail binary
    Email,
    /// Gotify push server
    Gotify,
}

impl NotifyTransport {
    /// Keys that must be non-empty for this transport.
    #[must_use]
    pub const fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Email => &["EMAIL_TO"],
            Self::Gotify => &["GOTIFY_URL", "GOTIFY_TOKEN"],
        }
    }
}

impl FromStr for NotifyTransport {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "email" => Ok(Self::Email),
            "gotify" => Ok(Self::Gotify),
            other => Err(UpdaterError::ConfigInvalid {
                reason: format!("NOTIFY_METHOD must be one of none, email, gotify (got '{other}')"),
            }),
        }
    }
}

impl fmt::Display for NotifyTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Email => "email",
            Self::Gotify => "gotify",
        })
    }
}

/// Transport together with its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifySettings {
    /// Notifications disabled
    None,
    /// Mail to a single recipient
    Email {
        /// Recipient address
        to: String,
        /// Sender address
        from: String,
    },
    /// Gotify push
    Gotify {
        /// Server base URL, e.g. `https://gotify.example.com`
        url: String,
        /// Application token
        token: String,
    },
}

impl NotifySettings {
    /// The transport these settings belong to.
    #[must_use]
    pub const fn transport(&self) -> NotifyTransport {
        match self {
            Self::None => NotifyTransport::None,
            Self::Email { .. } => NotifyTransport::Email,
            Self::Gotify { .. } => NotifyTransport::Gotify,
        }
    }
}

/// Immutable settings of one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Immich API key sent as `x-api-key`
    pub api_key: String,
    /// Orchestration binary, a path or a bare name looked up on `PATH`
    pub docker_bin: PathBuf,
    /// Directory holding the compose file
    pub immich_dir: PathBuf,
    /// Base URL of the local server, always with a scheme and no trailing slash
    pub immich_host: String,
    /// Notification transport and credentials
    pub notify: NotifySettings,
    /// Latest-release endpoint
    pub release_url: String,
    /// Status endpoint path on the local server
    pub status_path: String,
    /// Minimum release age in days
    pub min_release_age_days: i64,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Retry policy of both fetchers
    pub retry: RetryPolicy,
    /// Readiness wait budget
    pub ready_timeout: Duration,
    /// Interval between readiness probes
    pub ready_interval: Duration,
    /// Timeout of a single orchestration command
    pub compose_timeout: Duration,
    /// Whether to prune old images after an update
    pub prune_images: bool,
    /// Age threshold for pruning, in hours
    pub prune_age_hours: u64,
}

impl Config {
    /// Load and validate the settings file at `path`.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::ConfigMissing`] if the file does not exist
    /// - [`UpdaterError::ConfigInvalid`] if it cannot be parsed or a required
    ///   key is missing or empty
    /// - an I/O error with context if the file exists but cannot be read
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(UpdaterError::ConfigMissing {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let entries = parser::parse_entries(&content)?;
        debug!("Read {} setting(s) from {}", entries.len(), path.display());

        Ok(Self::from_entries(&entries)?)
    }

    /// Build a config from parsed entries.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::ConfigInvalid`] listing every missing required
    /// key, an unknown `NOTIFY_METHOD`, a malformed e-mail address, or a
    /// malformed optional value.
    pub fn from_entries(entries: &Entries) -> Result<Self, UpdaterError> {
        warn_unknown_keys(entries);

        let value = |key: &str| entries.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        // The transport decides which keys are required, so it is checked first
        let transport = value("NOTIFY_METHOD").map(NotifyTransport::from_str).transpose()?;

        let missing: Vec<&str> = ALWAYS_REQUIRED
            .iter()
            .chain(transport.map_or(&[][..], NotifyTransport::required_keys))
            .copied()
            .filter(|key| value(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(UpdaterError::ConfigInvalid {
                reason: format!("missing or empty: {}", missing.join(", ")),
            });
        }

        // Both lookups below are guaranteed by the missing-key check
        let required = |key: &str| value(key).unwrap_or_default().to_string();
        let notify = match transport.unwrap_or(NotifyTransport::None) {
            NotifyTransport::None => NotifySettings::None,
            NotifyTransport::Email => {
                let to = required("EMAIL_TO");
                let from = value("EMAIL_FROM").unwrap_or(DEFAULT_EMAIL_FROM).to_string();
                parse_mailbox("EMAIL_TO", &to)?;
                parse_mailbox("EMAIL_FROM", &from)?;
                NotifySettings::Email { to, from }
            }
            NotifyTransport::Gotify => NotifySettings::Gotify {
                url: required("GOTIFY_URL").trim_end_matches('/').to_string(),
                token: required("GOTIFY_TOKEN"),
            },
        };

        let retry_attempts = parse_or(value, "RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?;
        if retry_attempts == 0 {
            return Err(UpdaterError::ConfigInvalid {
                reason: "RETRY_ATTEMPTS must be at least 1".to_string(),
            });
        }

        let ready_interval = secs_or(value, "READY_INTERVAL_SECS", DEFAULT_READY_INTERVAL)?;
        if ready_interval.is_zero() {
            return Err(UpdaterError::ConfigInvalid {
                reason: "READY_INTERVAL_SECS must be at least 1".to_string(),
            });
        }

        Ok(Self {
            api_key: required("IMMICH_API_KEY"),
            docker_bin: PathBuf::from(expand_path("DOCKER_BIN", &required("DOCKER_BIN"))?),
            immich_dir: PathBuf::from(expand_path("IMMICH_DIR", &required("IMMICH_DIR"))?),
            immich_host: normalize_host(&required("IMMICH_HOST")),
            notify,
            release_url: value("RELEASE_URL").unwrap_or(DEFAULT_RELEASE_URL).to_string(),
            status_path: normalize_path(value("STATUS_PATH").unwrap_or(DEFAULT_STATUS_PATH)),
            min_release_age_days: parse_or(
                value,
                "MIN_RELEASE_AGE_DAYS",
                DEFAULT_MIN_RELEASE_AGE_DAYS,
            )?,
            http_timeout: secs_or(value, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT)?,
            retry: RetryPolicy::new(
                retry_attempts,
                secs_or(value, "RETRY_DELAY_SECS", DEFAULT_RETRY_DELAY)?,
            ),
            ready_timeout: secs_or(value, "READY_TIMEOUT_SECS", DEFAULT_READY_TIMEOUT)?,
            ready_interval,
            compose_timeout: secs_or(value, "COMPOSE_TIMEOUT_SECS", DEFAULT_COMPOSE_TIMEOUT)?,
            prune_images: bool_or(value, "PRUNE_IMAGES", true)?,
            prune_age_hours: parse_or(value, "PRUNE_AGE_HOURS", DEFAULT_PRUNE_AGE_HOURS)?,
        })
    }

    /// Full URL of the status endpoint.
    #[must_use]
    pub fn status_url(&self) -> String {
        format!("{}{}", self.immich_host, self.status_path)
    }
}

fn parse_or<'a, T, V>(value: V, key: &str, default: T) -> Result<T, UpdaterError>
where
    T: FromStr,
    V: Fn(&str) -> Option<&'a str>,
{
    match value(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| UpdaterError::ConfigInvalid {
            reason: format!("{key} must be a number (got '{raw}')"),
        }),
    }
}

fn secs_or<'a, V>(value: V, key: &str, default: Duration) -> Result<Duration, UpdaterError>
where
    V: Fn(&str) -> Option<&'a str>,
{
    parse_or(value, key, default.as_secs()).map(Duration::from_secs)
}

fn bool_or<'a, V>(value: V, key: &str, default: bool) -> Result<bool, UpdaterError>
where
    V: Fn(&str) -> Option<&'a str>,
{
    match value(key).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(UpdaterError::ConfigInvalid {
            reason: format!("{key} must be true or false (got '{other}')"),
        }),
    }
}

fn expand_path(key: &str, raw: &str) -> Result<String, UpdaterError> {
    shellexpand::full(raw)
        .map(|expanded| expanded.into_owned())
        .map_err(|e| UpdaterError::ConfigInvalid {
            reason: format!("{key}: {e}"),
        })
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn warn_unknown_keys(entries: &Entries) {
    for key in entries.keys().filter(|key| !KNOWN_KEYS.contains(&key.as_str())) {
        match suggest_key(key) {
            Some(known) => warn!("Ignoring unknown setting {key} (did you mean {known}?)"),
            None => warn!("Ignoring unknown setting {key}"),
        }
    }
}

/// Closest known key, if it is within a third of the key's length in edits.
#[must_use]
pub fn suggest_key(unknown: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, levenshtein(unknown, known)))
        .filter(|(_, distance)| *distance <= unknown.len() / 3)
        .min_by_key(|(_, distance)| *distance)
        .map(|(known, _)| known)
}
