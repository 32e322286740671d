//! Latest-release metadata from the GitHub releases API.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::UpdaterError;
use crate::utils::retry::{RetryPolicy, retry_until};
use crate::version::strip_v;

/// Metadata of the newest published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Tag as published, e.g. `v1.117.0`
    pub tag: String,
    /// Tag without the leading `v`
    pub version: String,
    /// Release notes (markdown), empty when the release has none
    pub body: String,
    /// Publish date in UTC; the time of day is dropped
    pub published_on: NaiveDate,
    /// Release page
    pub html_url: String,
}

// Every field is optional so that a `null` or partial document is detected
// as unusable and retried instead of failing the run on the first attempt.
#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: Option<String>,
    body: Option<String>,
    published_at: Option<DateTime<Utc>>,
    html_url: Option<String>,
}

impl GithubRelease {
    fn into_release_info(self) -> Option<ReleaseInfo> {
        let tag = self.tag_name.filter(|tag| !tag.trim().is_empty())?;
        let published_at = self.published_at?;

        Some(ReleaseInfo {
            version: strip_v(&tag).to_string(),
            tag,
            body: self.body.unwrap_or_default(),
            published_on: published_at.date_naive(),
            html_url: self.html_url.unwrap_or_default(),
        })
    }
}

/// Parse a release document.
///
/// Returns `Ok(None)` for an empty body, JSON `null`, or a document without a
/// tag or publish date.
///
/// # Errors
///
/// Returns an error if the text is not JSON of the expected shape.
pub fn parse_release(text: &str) -> Result<Option<ReleaseInfo>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let release: Option<GithubRelease> =
        serde_json::from_str(text).context("Failed to parse release document")?;
    Ok(release.and_then(GithubRelease::into_release_info))
}

async fn fetch_once(client: &Client, url: &str) -> Result<Option<ReleaseInfo>> {
    let response = client
        .get(url)
        .header(ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .context("Request failed")?;

    if let Some(remaining) = response.headers().get("x-ratelimit-remaining")
        && let Ok(remaining) = remaining.to_str()
        && let Ok(remaining) = remaining.parse::<u32>()
        && remaining < 10
    {
        warn!("GitHub rate limit low: {remaining} request(s) remaining");
    }

    let status = response.status();
    if !status.is_success() {
        bail!("release API returned HTTP {status}");
    }

    let text = response.text().await.context("Failed to read response body")?;
    parse_release(&text)
}

/// Fetch the latest release, retrying per `retry`.
///
/// # Errors
///
/// Returns [`UpdaterError::UpstreamUnavailable`] once every attempt failed or
/// returned an unusable document.
pub async fn fetch_latest_release(
    client: &Client,
    url: &str,
    retry: &RetryPolicy,
) -> Result<ReleaseInfo> {
    debug!("Fetching latest release from {url}");

    let release = retry_until(
        retry,
        "Fetching latest release",
        || fetch_once(client, url),
        Option::is_some,
    )
    .await
    .map_err(|exhausted| UpdaterError::UpstreamUnavailable {
        url: url.to_string(),
        attempts: exhausted.attempts,
        reason: exhausted.last_error,
    })?;

    match release {
        Some(release) => {
            info!("Latest release: {} (published {})", release.tag, release.published_on);
            Ok(release)
        }
        // retry_until only returns values accepted by Option::is_some
        None => Err(UpdaterError::UpstreamUnavailable {
            url: url.to_string(),
            attempts: retry.max_attempts,
            reason: "empty response".to_string(),
        }
        .into()),
    }
}
