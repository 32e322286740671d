//! Test utilities for immich-autoupdate
//!
//! Shared by the unit tests and the `integration` test target (through the
//! `test-utils` feature):
//!
//! - [`init_test_logging`] to see `tracing` output while a test runs;
//! - [`fixtures::FakeDocker`], a shell script standing in for the container
//!   CLI that records every invocation;
//! - [`fixtures::TestSettings`], a settings-file builder with timeouts short
//!   enough for tests;
//! - [`fixtures::release_json`] for release API responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use immich_autoupdate::test_utils::fixtures::{FakeDocker, TestSettings};
//! use std::path::Path;
//!
//! let dir = Path::new("/tmp/test");
//! let docker = FakeDocker::install(dir).unwrap();
//! let settings = TestSettings::new("http://127.0.0.1:8080", docker.path(), dir);
//! settings.write_to(&dir.join("immich-autoupdate.conf")).unwrap();
//! ```

pub mod fixtures;

pub use fixtures::{FakeDocker, TestSettings, about_json, release_json};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise `RUST_LOG` is honoured, and without it nothing is logged.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true) // Show targets like "compose"
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
