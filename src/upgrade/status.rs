//! Client for the local server's status endpoint.
//!
//! The endpoint answers `GET {host}/api/server/about` with a JSON document
//! whose `version` field holds the running release (`v1.116.2`). It is used
//! twice per run: once to learn the installed version, and again after
//! `compose up` to wait for the new containers to answer.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::constants::API_KEY_HEADER;
use crate::core::UpdaterError;
use crate::utils::retry::{RetryPolicy, retry_until};
use crate::version::strip_v;

#[derive(Debug, Deserialize)]
struct AboutResponse {
    version: Option<String>,
}

/// Outcome of [`StatusClient::wait_until_ready`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The endpoint answered with a version.
    Ready {
        /// Reported version, without a leading `v`
        version: String,
        /// Time spent waiting
        waited: Duration,
    },
    /// The wait budget ran out.
    TimedOut {
        /// Time spent waiting
        waited: Duration,
    },
}

/// Authenticated client for the status endpoint.
#[derive(Debug, Clone)]
pub struct StatusClient {
    client: Client,
    url: String,
    api_key: String,
}

impl StatusClient {
    /// Create a client for `url` authenticating with `api_key`.
    pub fn new(client: Client, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// A single request, returning the version if the response carried one.
    async fn probe(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("status endpoint returned HTTP {status}");
        }

        let text = response.text().await.context("Failed to read response body")?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        let about: Option<AboutResponse> =
            serde_json::from_str(&text).context("Failed to parse status response")?;
        Ok(about
            .and_then(|about| about.version)
            .map(|version| strip_v(&version).to_string())
            .filter(|version| !version.is_empty()))
    }

    /// Fetch the running version, retrying per `retry`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::ServiceUnreachable`] once every attempt failed
    /// or answered without a version.
    pub async fn fetch_running_version(&self, retry: &RetryPolicy) -> Result<String> {
        debug!("Querying running version at {}", self.url);

        let version = retry_until(
            retry,
            "Querying running version",
            || self.probe(),
            Option::is_some,
        )
        .await
        .map_err(|exhausted| UpdaterError::ServiceUnreachable {
            url: self.url.clone(),
            attempts: exhausted.attempts,
            reason: exhausted.last_error,
        })?;

        match version {
            Some(version) => {
                info!("Running version: {version}");
                Ok(version)
            }
            None => Err(UpdaterError::ServiceUnreachable {
                url: self.url.clone(),
                attempts: retry.max_attempts,
                reason: "empty or unusable response".to_string(),
            }
            .into()),
        }
    }

    /// Poll the endpoint every `interval` until it reports a version or
    /// `timeout` has elapsed. Probe failures are expected while containers
    /// restart and are only logged at debug level.
    ///
    /// The first probe is sent immediately. A probe that is still pending
    /// when the budget runs out is abandoned, so the wait never exceeds
    /// `timeout` by more than scheduling delay.
    pub async fn wait_until_ready(&self, timeout: Duration, interval: Duration) -> Readiness {
        let started = Instant::now();
        let deadline = started + timeout;
        info!(
            "Waiting up to {}s for Immich to become ready",
            timeout.as_secs()
        );

        loop {
            match tokio::time::timeout_at(deadline, self.probe()).await {
                Ok(Ok(Some(version))) => {
                    let waited = started.elapsed();
                    info!("Immich ready after {}s, running {version}", waited.as_secs());
                    return Readiness::Ready { version, waited };
                }
                Ok(Ok(None)) => debug!("Readiness probe: no version in response"),
                Ok(Err(e)) => debug!("Readiness probe failed: {e:#}"),
                Err(_) => debug!("Readiness probe abandoned at the deadline"),
            }

            let now = Instant::now();
            if now >= deadline {
                return Readiness::TimedOut {
                    waited: started.elapsed(),
                };
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }
}
