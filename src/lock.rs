//! Singleton guard for update runs.
//!
//! A run records its process id in a marker file. A second run that finds
//! the marker checks whether the recorded process is still alive: if it is,
//! the second run stops with [`UpdaterError::AlreadyRunning`]; if it is not,
//! or the marker cannot be parsed, the marker is stale and replaced.
//!
//! The marker is advisory. Checking and writing are two steps, so two runs
//! starting in the same instant can both proceed; scheduled runs a day apart
//! never do.
//!
//! # Example
//!
//! ```rust,no_run
//! use immich_autoupdate::lock::PidLock;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let _lock = PidLock::acquire(Path::new("/tmp/immich-autoupdate.lock"))?;
//! // ... update ...
//! // The marker is removed when _lock goes out of scope
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::UpdaterError;

/// Holds the PID marker for the lifetime of a run.
#[derive(Debug)]
pub struct PidLock {
    /// Marker path, removed on drop
    path: PathBuf,
    /// Our own process id, as written to the marker
    pid: u32,
}

impl Drop for PidLock {
    fn drop(&mut self) {
        debug!(pid = self.pid, "Releasing lock {}", self.path.display());
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove lock file {}: {e}", self.path.display());
        }
    }
}

impl PidLock {
    /// Take the marker at `path` for the current process.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::AlreadyRunning`] if a live process holds the marker
    /// - an I/O error with context if the marker cannot be read, removed, or
    ///   written
    pub fn acquire(path: &Path) -> Result<Self> {
        let pid = std::process::id();

        match std::fs::read_to_string(path) {
            Ok(content) => match parse_pid(&content) {
                Some(holder) if holder != pid && process_alive(holder) => {
                    return Err(UpdaterError::AlreadyRunning {
                        pid: holder,
                        lock_path: path.display().to_string(),
                    }
                    .into());
                }
                Some(holder) => {
                    warn!("Removing stale lock file {} (pid {holder} is not running)", path.display());
                    remove_stale(path)?;
                }
                None => {
                    warn!("Removing unreadable lock file {}", path.display());
                    remove_stale(path)?;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read lock file: {}", path.display()));
            }
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create lock directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, format!("{pid}\n"))
            .with_context(|| format!("Failed to write lock file: {}", path.display()))?;
        debug!(pid, "Acquired lock {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            pid,
        })
    }

    /// Marker path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("Failed to remove stale lock file: {}", path.display()))
        }
        _ => Ok(()),
    }
}

fn parse_pid(content: &str) -> Option<u32> {
    content.trim().parse().ok().filter(|pid| *pid > 0)
}

/// Whether a process with this id exists. A process owned by another user
/// counts as alive.
#[cfg(unix)]
#[must_use]
pub fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };

    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Without a liveness probe every recorded holder is assumed alive.
#[cfg(not(unix))]
#[must_use]
pub fn process_alive(_pid: u32) -> bool {
    true
}
