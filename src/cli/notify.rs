//! The `notify-test` command: send one notification through the configured
//! transport.
//!
//! Unlike a regular run, where delivery failures are only logged, a failed
//! delivery here ends the command with exit code 1.
//!
//! ```bash
//! immich-autoupdate notify-test
//! immich-autoupdate notify-test --priority high --message "Can you hear me?"
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use crate::config::Config;
use crate::notify::{Notifier, Priority};
use crate::utils::http::build_client;

const TEST_TITLE: &str = "immich-autoupdate test";

/// Send a test notification.
#[derive(Args, Debug, Default)]
pub struct NotifyTestCommand {
    /// Message body
    #[arg(long, default_value = "Notifications from immich-autoupdate are working.")]
    pub message: String,

    /// Notification priority
    #[arg(long, value_enum, default_value = "low")]
    pub priority: PriorityArg,
}

/// `--priority` values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PriorityArg {
    /// Informational
    #[default]
    Low,
    /// Like a successful update
    Normal,
    /// Like a failed update
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Self::Low,
            PriorityArg::Normal => Self::Normal,
            PriorityArg::High => Self::High,
        }
    }
}

impl NotifyTestCommand {
    /// Send the notification.
    ///
    /// # Errors
    ///
    /// Returns configuration errors and
    /// [`UpdaterError::NotificationFailed`](crate::core::UpdaterError::NotificationFailed)
    /// if the transport rejects the message.
    pub async fn execute(self, cli: &CliConfig) -> Result<()> {
        let config = Config::load(&cli.config_path)?;
        let client = build_client(config.http_timeout)?;
        let notifier = Notifier::from_settings(&config.notify, client)?;

        if matches!(notifier, Notifier::Disabled) {
            println!(
                "{} NOTIFY_METHOD is none, nothing to send",
                "⚠".yellow()
            );
            return Ok(());
        }

        notifier
            .send(TEST_TITLE, &self.message, self.priority.into())
            .await?;

        println!(
            "{} Test notification sent via {}",
            "✓".green(),
            notifier.transport_name()
        );
        Ok(())
    }
}
