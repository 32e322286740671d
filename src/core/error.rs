//! Error handling for immich-autoupdate
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`UpdaterError`]) for every failure kind the
//!    workflow distinguishes, so callers can match on them after they travel
//!    through `anyhow`.
//! 2. **User-friendly reporting** ([`ErrorContext`]) with a suggestion and
//!    details when the binary exits with an error.
//!
//! # Hard and soft kinds
//!
//! Most variants end the run with exit code 1. Three are *soft*:
//! [`UpdaterError::ReadinessTimeout`], [`UpdaterError::NotificationFailed`]
//! and [`UpdaterError::PruneFailed`]. They are constructed so they can be
//! logged with a consistent message, but they never escape a run.
//!
//! # Examples
//!
//! ```rust,no_run
//! use immich_autoupdate::core::{UpdaterError, user_friendly_error};
//!
//! let err = anyhow::Error::from(UpdaterError::ConfigMissing {
//!     path: "/etc/immich-autoupdate/immich-autoupdate.conf".to_string(),
//! });
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Every failure kind of an update run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdaterError {
    /// The settings file does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigMissing {
        /// Path that was looked up
        path: String,
    },

    /// The settings file exists but is unusable.
    #[error("Invalid configuration: {reason}")]
    ConfigInvalid {
        /// What is wrong with it
        reason: String,
    },

    /// Another run holds the lock marker and its process is alive.
    #[error("Another update run is already in progress (pid {pid})")]
    AlreadyRunning {
        /// PID recorded in the lock marker
        pid: u32,
        /// Lock marker path
        lock_path: String,
    },

    /// The remote release API never produced usable metadata.
    #[error("Release API unavailable after {attempts} attempt(s): {url}")]
    UpstreamUnavailable {
        /// Release API URL
        url: String,
        /// Attempts made
        attempts: usize,
        /// Last observed failure
        reason: String,
    },

    /// The local status endpoint never reported a version.
    #[error("Immich status endpoint unreachable after {attempts} attempt(s): {url}")]
    ServiceUnreachable {
        /// Status endpoint URL
        url: String,
        /// Attempts made
        attempts: usize,
        /// Last observed failure
        reason: String,
    },

    /// The release notes trip the breaking-change heuristic.
    #[error("Release {version} needs manual review: release notes mention '{keyword}'")]
    BlockedBreakingChange {
        /// Release version that was blocked
        version: String,
        /// First risk keyword found in the notes
        keyword: String,
        /// Canonical release page
        html_url: String,
    },

    /// `compose pull` / `compose up` (or the directory check before them) failed.
    #[error("Update step '{step}' failed: {reason}")]
    UpdateCommandFailed {
        /// Step that failed
        step: String,
        /// Failure detail
        reason: String,
    },

    /// Soft: the service did not become ready within the wait budget.
    #[error("Immich did not become ready within {waited_secs}s after the update")]
    ReadinessTimeout {
        /// Budget that elapsed
        waited_secs: u64,
    },

    /// Soft: a notification could not be delivered.
    #[error("Notification via {transport} failed: {reason}")]
    NotificationFailed {
        /// Transport name
        transport: String,
        /// Failure detail
        reason: String,
    },

    /// Soft: image pruning failed.
    #[error("Image prune failed: {reason}")]
    PruneFailed {
        /// Failure detail
        reason: String,
    },

    /// The run was stopped by a termination signal.
    #[error("Interrupted by {signal}")]
    Interrupted {
        /// Signal name
        signal: String,
    },
}

impl UpdaterError {
    /// Soft kinds are logged as warnings and never change the exit code.
    #[must_use]
    pub const fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::ReadinessTimeout { .. } | Self::NotificationFailed { .. } | Self::PruneFailed { .. }
        )
    }
}

/// An error paired with an optional suggestion and details for CLI output.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: anyhow::Error,
    /// How the user can fix it
    pub suggestion: Option<String>,
    /// Additional background
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error without suggestion or details.
    #[must_use]
    pub const fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colours.
    pub fn display(&self) {
        eprintln!("{}: {:#}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a suggestion for the
/// failure kinds this tool knows about.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let Some(kind) = error.downcast_ref::<UpdaterError>().cloned() else {
        return ErrorContext::new(error);
    };

    let ctx = ErrorContext::new(error);
    match kind {
        UpdaterError::ConfigMissing { .. } => ctx
            .with_suggestion("Create the settings file or point to it with --config")
            .with_details("The file holds KEY=value lines such as IMMICH_API_KEY and IMMICH_DIR"),
        UpdaterError::ConfigInvalid { .. } => ctx
            .with_suggestion("Run `immich-autoupdate validate` after fixing the settings file"),
        UpdaterError::AlreadyRunning { lock_path, .. } => ctx
            .with_suggestion("Wait for the other run to finish")
            .with_details(format!(
                "Remove {lock_path} only if you are sure no other run is active"
            )),
        UpdaterError::UpstreamUnavailable { reason, .. } => ctx
            .with_suggestion("Check network access to the release API or set RELEASE_URL")
            .with_details(reason),
        UpdaterError::ServiceUnreachable { reason, .. } => ctx
            .with_suggestion("Check IMMICH_HOST, IMMICH_API_KEY and that the server is running")
            .with_details(reason),
        UpdaterError::BlockedBreakingChange { html_url, .. } => ctx
            .with_suggestion("Read the release notes and update manually")
            .with_details(html_url),
        UpdaterError::UpdateCommandFailed { .. } => ctx
            .with_suggestion("Inspect the log file and run `docker compose up -d` manually"),
        UpdaterError::Interrupted { .. } => ctx,
        UpdaterError::ReadinessTimeout { .. }
        | UpdaterError::NotificationFailed { .. }
        | UpdaterError::PruneFailed { .. } => ctx,
    }
}
