//! Integration test suite for immich-autoupdate
//!
//! Every test runs the built binary against a `mockito` server standing in
//! for both the release API and the Immich status endpoint, with a shell
//! script standing in for `docker`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **check**: `check` prints the decision and changes nothing
//! - **lock**: overlapping runs, stale markers, `--no-lock`
//! - **notify_test**: `notify-test` against a Gotify mock
//! - **run**: full runs, exit codes, notifications and the run log
//! - **signal**: the lock marker is removed when a run is interrupted
//! - **validate**: settings validation and error reporting

mod common;

mod check;
mod lock;
mod notify_test;
mod run;
#[cfg(unix)]
mod signal;
mod validate;
