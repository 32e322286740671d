//! The update run from release check to notification.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use std::fmt;
use tracing::{error, info};

use super::decision::{Decision, decide};
use super::release::{ReleaseInfo, fetch_latest_release};
use super::status::{Readiness, StatusClient};
use super::updater::apply_update;
use crate::config::Config;
use crate::core::UpdaterError;
use crate::notify::{Notifier, Priority};

/// Both versions and what to do about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Newest published release
    pub release: ReleaseInfo,
    /// Version the server is running
    pub current: String,
    /// Policy decision
    pub decision: Decision,
}

/// How a run that did not fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Already on the latest release
    UpToDate {
        /// Running version
        version: String,
    },
    /// The latest release is too young
    SkippedTooRecent {
        /// Release that was skipped
        version: String,
        /// Its age in days
        days_since_release: i64,
    },
    /// Updated and answering again
    Updated {
        /// Previous version
        from: String,
        /// Installed version
        to: String,
    },
    /// Updated, but the server did not answer within the wait budget
    UpdatedNotReady {
        /// Previous version
        from: String,
        /// Installed version
        to: String,
        /// Seconds waited
        waited_secs: u64,
    },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate { version } => write!(f, "Immich {version} is up to date"),
            Self::SkippedTooRecent {
                version,
                days_since_release,
            } => write!(
                f,
                "Skipped Immich {version}: released {days_since_release} day(s) ago"
            ),
            Self::Updated { from, to } => write!(f, "Updated Immich from {from} to {to}"),
            Self::UpdatedNotReady {
                from,
                to,
                waited_secs,
            } => write!(
                f,
                "Updated Immich from {from} to {to}, but it did not answer within {waited_secs}s"
            ),
        }
    }
}

/// Status client for the configured server.
pub fn status_client(config: &Config, client: Client) -> StatusClient {
    StatusClient::new(client, config.status_url(), &config.api_key)
}

/// Fetch both versions and decide, as of `today` (UTC).
///
/// # Errors
///
/// Returns [`UpdaterError::UpstreamUnavailable`] or
/// [`UpdaterError::ServiceUnreachable`] when a fetch exhausts its retries.
pub async fn evaluate(config: &Config, client: &Client, today: NaiveDate) -> Result<Evaluation> {
    let release = fetch_latest_release(client, &config.release_url, &config.retry).await?;
    let current = status_client(config, client.clone())
        .fetch_running_version(&config.retry)
        .await?;

    let decision = decide(
        &release.version,
        &current,
        release.published_on,
        today,
        &release.body,
        config.min_release_age_days,
    );
    info!("Running {current}, latest {}: {decision}", release.version);

    Ok(Evaluation {
        release,
        current,
        decision,
    })
}

/// Run the full workflow for today's date.
///
/// Hard failures are reported through `notifier` at high priority before the
/// error is returned.
///
/// # Errors
///
/// Returns the hard failure that ended the run.
pub async fn run(config: &Config, client: &Client, notifier: &Notifier) -> Result<RunOutcome> {
    run_on(config, client, notifier, Utc::now().date_naive()).await
}

/// [`run`] as of a given date.
///
/// # Errors
///
/// Returns the hard failure that ended the run.
pub async fn run_on(
    config: &Config,
    client: &Client,
    notifier: &Notifier,
    today: NaiveDate,
) -> Result<RunOutcome> {
    let result = execute(config, client, notifier, today).await;
    match &result {
        Ok(outcome) => info!("{outcome}"),
        Err(e) => notify_failure(notifier, e).await,
    }
    result
}

async fn execute(
    config: &Config,
    client: &Client,
    notifier: &Notifier,
    today: NaiveDate,
) -> Result<RunOutcome> {
    info!("Checking for Immich updates");
    let Evaluation {
        release,
        current,
        decision,
    } = evaluate(config, client, today).await?;

    match decision {
        Decision::UpToDate => Ok(RunOutcome::UpToDate { version: current }),
        Decision::SkipTooRecent {
            days_since_release, ..
        } => Ok(RunOutcome::SkippedTooRecent {
            version: release.version,
            days_since_release,
        }),
        Decision::BlockedBreakingChange { keyword } => Err(UpdaterError::BlockedBreakingChange {
            version: release.version,
            keyword,
            html_url: release.html_url,
        }
        .into()),
        Decision::Update => {
            let status = status_client(config, client.clone());
            match apply_update(config, &status, &release.version).await? {
                Readiness::Ready { .. } => {
                    notifier
                        .notify(
                            "Immich updated",
                            &format!(
                                "Immich was updated from {current} to {}.\n\n{}",
                                release.version, release.html_url
                            ),
                            Priority::Normal,
                        )
                        .await;
                    Ok(RunOutcome::Updated {
                        from: current,
                        to: release.version,
                    })
                }
                Readiness::TimedOut { waited } => {
                    notifier
                        .notify(
                            "Immich updated but not responding",
                            &format!(
                                "Immich was updated from {current} to {}, but did not respond \
                                 within {}s. Check the containers.\n\n{}",
                                release.version,
                                waited.as_secs(),
                                release.html_url
                            ),
                            Priority::High,
                        )
                        .await;
                    Ok(RunOutcome::UpdatedNotReady {
                        from: current,
                        to: release.version,
                        waited_secs: waited.as_secs(),
                    })
                }
            }
        }
    }
}

/// Title and body of the notification for a hard failure.
#[must_use]
pub fn failure_message(error: &anyhow::Error) -> (&'static str, String) {
    match error.downcast_ref::<UpdaterError>() {
        Some(UpdaterError::BlockedBreakingChange {
            version,
            keyword,
            html_url,
        }) => (
            "Immich update needs review",
            format!(
                "Immich {version} was not installed because its release notes mention \
                 '{keyword}'. Review them and update manually:\n\n{html_url}"
            ),
        ),
        Some(UpdaterError::Interrupted { signal }) => (
            "Immich update interrupted",
            format!("The update run was stopped by {signal}."),
        ),
        _ => ("Immich update failed", format!("{error:#}")),
    }
}

/// Log a hard failure and send its notification at high priority.
pub async fn notify_failure(notifier: &Notifier, error: &anyhow::Error) {
    error!("{error:#}");

    let (title, message) = failure_message(error);
    notifier.notify(title, &message, Priority::High).await;
}
