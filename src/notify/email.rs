//! E-mail transport through the local sendmail binary.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSendmailTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;

use super::Priority;
use crate::core::UpdaterError;

/// Subject prefix of high-priority mail.
pub const URGENT_PREFIX: &str = "[URGENT] ";

/// Sends plain-text mail to a single recipient.
#[derive(Debug)]
pub struct EmailNotifier {
    from: Mailbox,
    to: Mailbox,
    sendmail: Option<PathBuf>,
}

/// Parse `address`, naming `key` in the error.
pub(crate) fn parse_mailbox(key: &str, address: &str) -> Result<Mailbox, UpdaterError> {
    address.parse().map_err(|e| UpdaterError::ConfigInvalid {
        reason: format!("{key} is not a valid address ('{address}'): {e}"),
    })
}

/// Subject line for a notification title.
#[must_use]
pub fn subject_for(title: &str, priority: Priority) -> String {
    if priority == Priority::High {
        format!("{URGENT_PREFIX}{title}")
    } else {
        title.to_string()
    }
}

impl EmailNotifier {
    /// Create a notifier mailing `to` from `from` via `sendmail` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::ConfigInvalid`] if either address is malformed.
    pub fn new(to: &str, from: &str) -> Result<Self, UpdaterError> {
        Ok(Self {
            from: parse_mailbox("EMAIL_FROM", from)?,
            to: parse_mailbox("EMAIL_TO", to)?,
            sendmail: None,
        })
    }

    /// Use a specific sendmail-compatible binary.
    #[must_use]
    pub fn with_sendmail_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.sendmail = Some(command.into());
        self
    }

    fn build_message(&self, title: &str, body: &str, priority: Priority) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject_for(title, priority))
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())
            .context("Failed to build email message")
    }

    /// Hand one message to sendmail.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or sendmail fails.
    pub async fn send(&self, title: &str, body: &str, priority: Priority) -> Result<()> {
        let message = self.build_message(title, body, priority)?;

        let transport = match &self.sendmail {
            Some(command) => {
                AsyncSendmailTransport::<Tokio1Executor>::new_with_command(command.as_os_str())
            }
            None => AsyncSendmailTransport::<Tokio1Executor>::new(),
        };

        transport.send(message).await.context("sendmail failed")?;
        Ok(())
    }
}
