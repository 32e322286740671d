//! Update workflow for an Immich deployment.
//!
//! # Architecture Overview
//!
//! - **[`release`]**: latest-release metadata from the GitHub releases API
//! - **[`status`]**: running version and readiness from the local server
//! - **[`decision`]**: the policy deciding whether to install a release
//! - **[`compose`]**: builder for container CLI invocations
//! - **[`updater`]**: pull, restart, wait, prune
//! - **[`pipeline`]**: one run from release check to notification
//!
//! ## Run Flow
//!
//! ```text
//! 1. Evaluate
//!    ├── Fetch latest release (retried)
//!    ├── Fetch running version (retried)
//!    └── Decide: too recent / blocked / up to date / update
//!
//! 2. Update (only on "update")
//!    ├── compose pull
//!    ├── compose up -d
//!    ├── Poll status endpoint until ready or timeout (warning)
//!    └── image prune (best effort)
//!
//! 3. Report
//!    ├── Success: normal-priority notification
//!    └── Blocked or failed: high-priority notification, exit 1
//! ```
//!
//! Releases younger than `MIN_RELEASE_AGE_DAYS` and installations that are
//! already current end the run quietly with exit code 0.

pub mod compose;
pub mod decision;
pub mod pipeline;
pub mod release;
pub mod status;
pub mod updater;

pub use decision::{Decision, decide};
pub use pipeline::{Evaluation, RunOutcome, evaluate, run};
pub use release::{ReleaseInfo, fetch_latest_release};
pub use status::{Readiness, StatusClient};
