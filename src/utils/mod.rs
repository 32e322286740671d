//! Plumbing shared by the update stages.
//!
//! - [`http`] - the `reqwest` client every request goes through
//! - [`retry`] - fixed-interval retry with an acceptance predicate
//! - [`signal`] - waiting for SIGINT, SIGTERM or SIGHUP

pub mod http;
pub mod retry;
pub mod signal;
