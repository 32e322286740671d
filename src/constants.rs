//! Global constants used throughout immich-autoupdate.
//!
//! Default timeouts, retry parameters, paths and endpoint locations live here
//! so the settings loader, the CLI and the tests agree on them.

use std::time::Duration;

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/immich-autoupdate/immich-autoupdate.conf";

/// Default location of the run log.
pub const DEFAULT_LOG_PATH: &str = "/var/log/immich-autoupdate.log";

/// Default location of the PID lock marker.
pub const DEFAULT_LOCK_PATH: &str = "/tmp/immich-autoupdate.lock";

/// Latest-release endpoint of the upstream project.
pub const DEFAULT_RELEASE_URL: &str =
    "https://api.github.com/repos/immich-app/immich/releases/latest";

/// Status endpoint path on the local server; reports `{"version": "v1.x.y", ...}`.
pub const DEFAULT_STATUS_PATH: &str = "/api/server/about";

/// Header carrying the Immich API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// User agent sent with every request. GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("immich-autoupdate/", env!("CARGO_PKG_VERSION"));

/// Releases younger than this many days are not installed.
pub const DEFAULT_MIN_RELEASE_AGE_DAYS: i64 = 7;

/// Timeout for a single HTTP request (30 seconds).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts made by each fetcher before giving up.
pub const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Fixed delay between fetch attempts (5 seconds).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How long to wait for the server to come back after `compose up` (5 minutes).
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(300);

/// Interval between readiness probes (10 seconds).
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_secs(10);

/// Timeout for a single orchestration command (30 minutes).
///
/// `compose pull` downloads several large images, so this is generous.
pub const DEFAULT_COMPOSE_TIMEOUT: Duration = Duration::from_secs(1800);

/// Images unused for longer than this many hours are pruned.
pub const DEFAULT_PRUNE_AGE_HOURS: u64 = 24;

/// Case-insensitive phrases in release notes that block an automatic update.
pub const RISK_KEYWORDS: &[&str] = &["breaking change", "important note", "caution", "warning"];
