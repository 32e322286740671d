//! Outcome notifications.
//!
//! A [`Notifier`] is built once from the configured [`NotifySettings`] and
//! dispatches to one of three transports: nothing, a Gotify server, or the
//! local sendmail binary. Delivery is best effort during a run:
//! [`Notifier::notify`] logs a failure as a warning and returns normally, so a
//! broken transport never changes the outcome of an update. Only
//! `notify-test` uses [`Notifier::send`] and looks at the result.

pub mod email;
pub mod gotify;

use reqwest::Client;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::NotifySettings;
use crate::core::UpdaterError;
pub use email::EmailNotifier;
pub use gotify::GotifyNotifier;

/// Urgency of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Informational
    Low,
    /// Successful update
    Normal,
    /// Failure or manual action required
    High,
}

impl Priority {
    /// Gotify's numeric priority for this level.
    #[must_use]
    pub const fn gotify_value(self) -> u8 {
        match self {
            Self::Low => 2,
            Self::Normal => 5,
            Self::High => 8,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        })
    }
}

/// Configured notification transport.
#[derive(Debug)]
pub enum Notifier {
    /// `NOTIFY_METHOD=none`
    Disabled,
    /// `NOTIFY_METHOD=email`
    Email(EmailNotifier),
    /// `NOTIFY_METHOD=gotify`
    Gotify(GotifyNotifier),
}

impl Notifier {
    /// Build the notifier for `settings`. The HTTP client is only used by
    /// Gotify.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::ConfigInvalid`] if an e-mail address cannot be
    /// parsed.
    pub fn from_settings(settings: &NotifySettings, client: Client) -> Result<Self, UpdaterError> {
        Ok(match settings {
            NotifySettings::None => Self::Disabled,
            NotifySettings::Email { to, from } => Self::Email(EmailNotifier::new(to, from)?),
            NotifySettings::Gotify { url, token } => {
                Self::Gotify(GotifyNotifier::new(client, url, token))
            }
        })
    }

    /// Transport name used in log lines and errors.
    #[must_use]
    pub const fn transport_name(&self) -> &'static str {
        match self {
            Self::Disabled => "none",
            Self::Email(_) => "email",
            Self::Gotify(_) => "gotify",
        }
    }

    /// Deliver a notification and report failure to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::NotificationFailed`] if the transport rejects
    /// the message.
    pub async fn send(
        &self,
        title: &str,
        message: &str,
        priority: Priority,
    ) -> Result<(), UpdaterError> {
        let result = match self {
            Self::Disabled => {
                debug!("Notifications disabled, not sending '{title}'");
                return Ok(());
            }
            Self::Email(email) => email.send(title, message, priority).await,
            Self::Gotify(gotify) => gotify.send(title, message, priority).await,
        };

        result.map_err(|e| UpdaterError::NotificationFailed {
            transport: self.transport_name().to_string(),
            reason: format!("{e:#}"),
        })?;

        info!(priority = %priority, "Notification sent via {}: {title}", self.transport_name());
        Ok(())
    }

    /// Deliver a notification, logging any failure as a warning.
    pub async fn notify(&self, title: &str, message: &str, priority: Priority) {
        if let Err(e) = self.send(title, message, priority).await {
            warn!("{e}");
        }
    }
}
