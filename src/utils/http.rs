//! Shared HTTP client construction.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::constants::USER_AGENT;

/// Build the client used for every request of a run.
///
/// The timeout bounds the whole request (connect, send, and body read), so a
/// hung peer stalls a run for at most `timeout` per attempt.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}
