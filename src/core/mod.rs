//! Core types shared by every stage of an update run.
//!
//! ## `error` - Error Handling
//!
//! - [`UpdaterError`] - every failure kind a run distinguishes, hard and soft
//! - [`ErrorContext`] - user-facing wrapper with a suggestion and details
//! - [`user_friendly_error`] - recover the typed kind from an `anyhow::Error`
//!
//! Fallible plumbing returns `anyhow::Result` and adds context with
//! `.context(...)`; the typed kinds are raised with `UpdaterError::...into()`
//! and recovered at the top level with `downcast_ref`.

pub mod error;

pub use error::{ErrorContext, UpdaterError, user_friendly_error};
