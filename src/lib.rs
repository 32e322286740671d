//! immich-autoupdate - scheduled updater for self-hosted Immich
//!
//! Runs from cron or a systemd timer next to a docker-compose Immich
//! deployment. Each run compares the latest upstream release with the version
//! the server reports and, if policy allows, pulls the new images, restarts
//! the stack, waits for the server to answer, and reports the result.
//!
//! # Architecture Overview
//!
//! ## Core Functionality
//! - [`cli`] - `run`, `check`, `validate` and `notify-test` commands
//! - [`config`] - `KEY=value` settings file parsed into an immutable [`config::Config`]
//! - [`upgrade`] - release check, update policy, compose orchestration, readiness wait
//! - [`notify`] - e-mail and Gotify notifications
//!
//! ## Supporting Modules
//! - [`core`] - error kinds and user-facing error reporting
//! - [`lock`] - PID marker preventing overlapping runs
//! - [`logging`] - stderr output and the timestamped run log
//! - [`utils`] - HTTP client, retry helper, termination signals
//! - [`version`] - release version comparison
//! - [`constants`] - defaults shared by the loader, the CLI and tests
//!
//! # Update Policy
//!
//! A release is installed only when all of the following hold:
//! 1. it was published at least `MIN_RELEASE_AGE_DAYS` days ago;
//! 2. its release notes do not mention a risk keyword such as
//!    "breaking change" (otherwise a high-priority notification asks for a
//!    manual update);
//! 3. it is newer than the running version.
//!
//! # Settings File
//!
//! ```text
//! IMMICH_API_KEY="..."
//! DOCKER_BIN="/usr/bin/docker"
//! IMMICH_DIR="/opt/immich"
//! IMMICH_HOST="http://localhost:2283"
//! NOTIFY_METHOD="gotify"
//! GOTIFY_URL="https://gotify.example.com"
//! GOTIFY_TOKEN="..."
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod lock;
pub mod logging;
pub mod notify;
pub mod upgrade;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
