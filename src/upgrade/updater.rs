//! Applying an update to the deployment.
//!
//! The steps run strictly in order and each depends on the previous one:
//!
//! 1. resolve the container CLI and check the deployment directory;
//! 2. `compose pull`, then `compose up -d`;
//! 3. poll the status endpoint until the server answers again;
//! 4. optionally prune old images.
//!
//! Failures in steps 1 and 2 are fatal ([`UpdaterError::UpdateCommandFailed`]).
//! A server that does not come back in time and a failed prune are only
//! warnings: the new containers are already running at that point.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::compose::ComposeCommand;
use super::status::{Readiness, StatusClient};
use crate::config::Config;
use crate::core::UpdaterError;
use crate::version::compare_versions;

/// Resolve `DOCKER_BIN` to an executable, searching `PATH` for bare names.
///
/// # Errors
///
/// Returns [`UpdaterError::UpdateCommandFailed`] if no executable is found.
pub fn resolve_docker_bin(bin: &Path) -> Result<PathBuf, UpdaterError> {
    which::which(bin).map_err(|e| UpdaterError::UpdateCommandFailed {
        step: "locate container CLI".to_string(),
        reason: format!("{}: {e}", bin.display()),
    })
}

/// Pull and restart the deployment, then wait for it to answer.
///
/// `target` is the version being installed; a different version reported
/// after the restart is logged as a warning.
///
/// # Errors
///
/// Returns [`UpdaterError::UpdateCommandFailed`] if the container CLI cannot
/// be found, the deployment directory is missing, or `compose pull` /
/// `compose up -d` fails.
pub async fn apply_update(
    config: &Config,
    status: &StatusClient,
    target: &str,
) -> Result<Readiness> {
    let docker = resolve_docker_bin(&config.docker_bin)?;

    if !config.immich_dir.is_dir() {
        return Err(UpdaterError::UpdateCommandFailed {
            step: "check deployment directory".to_string(),
            reason: format!("{} does not exist", config.immich_dir.display()),
        }
        .into());
    }

    info!("Updating Immich to {target} in {}", config.immich_dir.display());

    ComposeCommand::pull(&docker)
        .current_dir(&config.immich_dir)
        .with_timeout(Some(config.compose_timeout))
        .execute_success()
        .await?;

    ComposeCommand::up(&docker)
        .current_dir(&config.immich_dir)
        .with_timeout(Some(config.compose_timeout))
        .execute_success()
        .await?;

    let readiness = status.wait_until_ready(config.ready_timeout, config.ready_interval).await;
    match &readiness {
        Readiness::Ready { version, .. } if compare_versions(version, target).is_ne() => {
            warn!("Immich reports version {version} after updating to {target}");
        }
        Readiness::Ready { .. } => {}
        Readiness::TimedOut { waited } => {
            warn!(
                "{}",
                UpdaterError::ReadinessTimeout {
                    waited_secs: waited.as_secs()
                }
            );
        }
    }

    if config.prune_images
        && let Err(e) = prune_images(config, &docker).await
    {
        warn!("{e}");
    }

    Ok(readiness)
}

/// Remove images unused for longer than `PRUNE_AGE_HOURS`.
///
/// # Errors
///
/// Returns [`UpdaterError::PruneFailed`] if the command fails.
pub async fn prune_images(config: &Config, docker: &Path) -> Result<(), UpdaterError> {
    ComposeCommand::prune_images(docker, config.prune_age_hours)
        .current_dir(&config.immich_dir)
        .with_timeout(Some(config.compose_timeout))
        .execute_success()
        .await
        .map_err(|e| UpdaterError::PruneFailed {
            reason: format!("{e:#}"),
        })
}
